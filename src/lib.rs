//! sheet-discount - batch price discounts for Excel workbooks
//!
//! For every requested sheet of a workbook, the price column (C) is read, a
//! discount is applied, the corrected prices are written to column E with a
//! currency style, and a bar chart of the corrected prices is attached. The
//! result is saved as `<name>_processed.xlsx`.
//!
//! # Features
//!
//! - In-memory workbook model with named styles and charts
//! - Excel import (calamine) and export (rust_xlsxwriter)
//! - Parallel batch processing over a fixed-size worker pool
//! - Synthetic transaction workbooks for testing
//!
//! # Example
//!
//! ```no_run
//! use sheet_discount::batch::parallel_process;
//! use std::path::{Path, PathBuf};
//!
//! let files = vec![PathBuf::from("transactions.xlsx")];
//! let sheets = vec!["Sheet1".to_string(), "Sheet2".to_string()];
//! parallel_process(&files, &sheets, 0.1, Path::new("processed_files"))?;
//! # Ok::<(), sheet_discount::error::DiscountError>(())
//! ```

pub mod batch;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod generator;
pub mod types;

// Re-export commonly used types
pub use config::{BatchOptions, BatchPlan, MissingInputPolicy};
pub use error::{DiscountError, DiscountResult};
pub use types::{Cell, CellValue, ChartSpec, DiscountJob, NamedStyle, Sheet, Workbook};
