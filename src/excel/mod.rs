//! Excel container I/O
//!
//! - Import: Excel (.xlsx) → [`Workbook`](crate::types::Workbook) via calamine,
//!   with cell number formats read from the container by [`formats`]
//! - Export: [`Workbook`](crate::types::Workbook) → Excel (.xlsx) via rust_xlsxwriter,
//!   including named styles and charts

mod exporter;
pub mod formats;
mod importer;

pub use exporter::ExcelExporter;
pub use importer::ExcelImporter;

use crate::error::DiscountResult;
use crate::types::Workbook;
use std::path::Path;

/// Load a workbook from an .xlsx file
pub fn load_workbook<P: AsRef<Path>>(path: P) -> DiscountResult<Workbook> {
    ExcelImporter::new(path).import()
}

/// Save a workbook to an .xlsx file, overwriting any existing file
pub fn save_workbook<P: AsRef<Path>>(workbook: &Workbook, path: P) -> DiscountResult<()> {
    ExcelExporter::new(workbook).export(path.as_ref())
}
