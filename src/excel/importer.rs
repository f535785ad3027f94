//! Excel importer implementation - Excel (.xlsx) → in-memory workbook

use super::formats::read_sheet_styles;
use crate::error::{DiscountError, DiscountResult};
use crate::types::{Cell, CellValue, NamedStyle, Sheet, Workbook};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::path::{Path, PathBuf};

/// Loads .xlsx files into a [`Workbook`]
pub struct ExcelImporter {
    path: PathBuf,
}

impl ExcelImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read every sheet, in workbook order, with values, formulas and cell formats
    pub fn import(&self) -> DiscountResult<Workbook> {
        if !self.path.exists() {
            return Err(DiscountError::NotFound(self.path.clone()));
        }

        let mut source: Xlsx<_> = open_workbook(&self.path).map_err(|e| {
            DiscountError::Load(format!("{}: {}", self.path.display(), e))
        })?;

        let mut styles = read_sheet_styles(&self.path)?;
        let mut workbook = Workbook::new();

        for sheet_name in source.sheet_names().to_vec() {
            let values = source
                .worksheet_range(&sheet_name)
                .map_err(|e| DiscountError::Load(format!("sheet \"{}\": {}", sheet_name, e)))?;
            // Formula parts are optional in the container
            let formulas = source.worksheet_formula(&sheet_name).ok();

            let mut sheet = Self::build_sheet(&sheet_name, &values, formulas.as_ref());
            for ((row, col), style) in styles.remove(&sheet_name).unwrap_or_default() {
                // styled cells without a value are not carried over
                if sheet.cell(row, col).is_some() {
                    let name = Self::register_style(&mut workbook, style);
                    sheet.set_style(row, col, &name);
                }
            }
            tracing::debug!(
                sheet = %sheet_name,
                max_row = sheet.max_row(),
                max_column = sheet.max_column(),
                "loaded sheet"
            );
            workbook.push_sheet(sheet)?;
        }

        Ok(workbook)
    }

    fn build_sheet(name: &str, values: &Range<Data>, formulas: Option<&Range<String>>) -> Sheet {
        let mut sheet = Sheet::new(name);

        // calamine ranges start at the first used cell, not A1
        if let Some((row0, col0)) = values.start() {
            for (row, col, data) in values.used_cells() {
                let value = Self::convert_data(data);
                if value.is_empty() {
                    continue;
                }
                sheet.insert_cell(row0 + row as u32 + 1, col0 + col as u32 + 1, Cell::new(value));
            }
        }

        if let Some(formulas) = formulas {
            if let Some((row0, col0)) = formulas.start() {
                for (row, col, formula) in formulas.used_cells() {
                    if formula.is_empty() {
                        continue;
                    }
                    let formula = formula.strip_prefix('=').unwrap_or(formula);
                    sheet
                        .cell_mut(row0 + row as u32 + 1, col0 + col as u32 + 1)
                        .formula = Some(formula.to_string());
                }
            }
        }

        sheet
    }

    /// Register a loaded style and return the name cells should reference.
    ///
    /// A name already bound to a different format falls back to the format code.
    fn register_style(workbook: &mut Workbook, style: NamedStyle) -> String {
        let fallback = match workbook.style(&style.name) {
            Some(existing) if existing.number_format != style.number_format => {
                NamedStyle::new(style.number_format.clone(), style.number_format)
            }
            _ => style,
        };
        let name = fallback.name.clone();
        workbook.register_style(fallback);
        name
    }

    /// Convert a calamine cell into the model's tagged value
    fn convert_data(data: &Data) -> CellValue {
        match data {
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
            Data::Empty => CellValue::Empty,
        }
    }
}
