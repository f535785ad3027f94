//! Excel exporter implementation - in-memory workbook → Excel (.xlsx)

use crate::error::{DiscountError, DiscountResult};
use crate::types::{Cell, CellValue, ChartKind, ChartSpec, Sheet, Workbook};
use rust_xlsxwriter::{Chart, ChartType, Format, Formula, Workbook as XlsxWorkbook, Worksheet};
use std::collections::HashMap;
use std::path::Path;

/// Default display format for date cells that carry no named style
const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Writes a [`Workbook`] to an .xlsx container, including named styles and charts
pub struct ExcelExporter<'a> {
    workbook: &'a Workbook,
    /// One shared `Format` per registered style name
    formats: HashMap<String, Format>,
    date_format: Format,
}

impl<'a> ExcelExporter<'a> {
    pub fn new(workbook: &'a Workbook) -> Self {
        let formats = workbook
            .styles()
            .map(|style| {
                (
                    style.name.clone(),
                    Format::new().set_num_format(&style.number_format),
                )
            })
            .collect();

        Self {
            workbook,
            formats,
            date_format: Format::new().set_num_format(DATE_FORMAT),
        }
    }

    /// Serialize the workbook and write it to `output_path`.
    ///
    /// The container is built fully in memory first, so a failure leaves any
    /// existing file at `output_path` untouched.
    pub fn export(&self, output_path: &Path) -> DiscountResult<()> {
        let buffer = self.to_buffer()?;
        std::fs::write(output_path, buffer)
            .map_err(|e| DiscountError::Save(format!("{}: {}", output_path.display(), e)))?;
        Ok(())
    }

    /// Serialize the workbook to xlsx bytes
    pub fn to_buffer(&self) -> DiscountResult<Vec<u8>> {
        let mut book = XlsxWorkbook::new();

        for sheet in self.workbook.sheets() {
            self.export_sheet(&mut book, sheet)?;
        }

        book.save_to_buffer()
            .map_err(|e| DiscountError::Save(e.to_string()))
    }

    fn export_sheet(&self, book: &mut XlsxWorkbook, sheet: &Sheet) -> DiscountResult<()> {
        let worksheet = book.add_worksheet();
        worksheet
            .set_name(&sheet.name)
            .map_err(|e| DiscountError::Save(format!("Failed to set worksheet name: {}", e)))?;

        for ((row, col), cell) in sheet.cells() {
            self.write_cell(worksheet, row - 1, (col - 1) as u16, cell)?;
        }

        for chart in sheet.charts() {
            let built = Self::build_chart(chart, &sheet.name);
            let (row, col) = chart.anchor;
            worksheet
                .insert_chart(row - 1, (col - 1) as u16, &built)
                .map_err(|e| DiscountError::Chart(format!("{}: {}", chart.title, e)))?;
        }

        Ok(())
    }

    /// Resolve the cell's named style; unknown names fall back to no format
    fn format_for(&self, cell: &Cell) -> Option<&Format> {
        let name = cell.style.as_deref()?;
        let format = self.formats.get(name);
        if format.is_none() {
            tracing::warn!(style = name, "cell references unregistered style");
        }
        format
    }

    /// Write a single cell (0-indexed position)
    fn write_cell(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        cell: &Cell,
    ) -> DiscountResult<()> {
        let format = self.format_for(cell);
        let result = if let Some(formula) = &cell.formula {
            let formula = Formula::new(format!("={}", formula));
            match format {
                Some(f) => worksheet.write_formula_with_format(row, col, formula, f),
                None => worksheet.write_formula(row, col, formula),
            }
        } else {
            match (&cell.value, format) {
                (CellValue::Number(n), Some(f)) => worksheet.write_number_with_format(row, col, *n, f),
                (CellValue::Number(n), None) => worksheet.write_number(row, col, *n),
                (CellValue::DateTime(serial), f) => {
                    worksheet.write_number_with_format(row, col, *serial, f.unwrap_or(&self.date_format))
                }
                (CellValue::Text(s) | CellValue::Error(s), Some(f)) => {
                    worksheet.write_string_with_format(row, col, s, f)
                }
                (CellValue::Text(s) | CellValue::Error(s), None) => worksheet.write_string(row, col, s),
                (CellValue::Bool(b), Some(f)) => worksheet.write_boolean_with_format(row, col, *b, f),
                (CellValue::Bool(b), None) => worksheet.write_boolean(row, col, *b),
                (CellValue::Empty, Some(f)) => worksheet.write_blank(row, col, f),
                (CellValue::Empty, None) => return Ok(()),
            }
        };

        result
            .map(|_| ())
            .map_err(|e| DiscountError::Save(format!("Failed to write cell ({}, {}): {}", row + 1, col + 1, e)))
    }

    /// Build the rust_xlsxwriter chart for a spec attached to `sheet_name`
    fn build_chart(spec: &ChartSpec, sheet_name: &str) -> Chart {
        let chart_type = match spec.kind {
            ChartKind::Bar => ChartType::Column,
        };
        let mut chart = Chart::new(chart_type);

        let range = spec.values;
        let col = (range.column - 1) as u16;
        chart.add_series().set_values((
            sheet_name,
            range.first_row - 1,
            col,
            range.last_row - 1,
            col,
        ));

        chart.title().set_name(&spec.title);
        chart.x_axis().set_name(&spec.x_axis_title);
        chart.y_axis().set_name(&spec.y_axis_title);
        chart
    }
}
