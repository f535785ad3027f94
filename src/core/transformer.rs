//! Discount-and-chart transform
//!
//! [`DiscountTransformer`] works on an in-memory [`Workbook`]; [`transform_workbook`]
//! wraps it with load/save, and [`process_workbook`] is the batch-safe entry
//! point that reports errors instead of returning them.

use crate::error::{DiscountError, DiscountResult};
use crate::excel::{load_workbook, save_workbook};
use crate::types::{ChartKind, ChartSpec, ColumnRange, NamedStyle, Sheet, Workbook};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

/// Name of the currency style registered on every processed workbook
pub const CURRENCY_STYLE: &str = "dollar_style";
/// Number format of [`CURRENCY_STYLE`]
pub const CURRENCY_FORMAT: &str = "\"$\"#,##0.00";

/// Column holding the original price
pub const PRICE_COLUMN: u32 = 3;
/// Column receiving the discounted price
pub const CORRECTED_PRICE_COLUMN: u32 = 5;
/// Row 1 is the header
pub const FIRST_DATA_ROW: u32 = 2;

/// Round to `places` decimals the way the reference numeric library does:
/// correctly rounded from the exact binary value, ties to even.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

/// The currency style definition
pub fn currency_style() -> NamedStyle {
    NamedStyle::new(CURRENCY_STYLE, CURRENCY_FORMAT)
}

/// Reject discounts outside `[0, 1)`
pub fn validate_discount(discount: f64) -> DiscountResult<()> {
    if discount.is_finite() && (0.0..1.0).contains(&discount) {
        Ok(())
    } else {
        Err(DiscountError::InvalidDiscount(discount))
    }
}

/// Result of processing one requested sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOutcome {
    /// Sheet found; `rows_written` corrected prices were written
    Processed { rows_written: usize },
    /// Sheet not present in the workbook, nothing changed
    Missing,
}

/// Per-file summary returned by [`transform_workbook`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformSummary {
    pub output: PathBuf,
    pub sheets: Vec<(String, SheetOutcome)>,
}

impl TransformSummary {
    pub fn processed_sheets(&self) -> usize {
        self.sheets
            .iter()
            .filter(|(_, outcome)| matches!(outcome, SheetOutcome::Processed { .. }))
            .count()
    }

    pub fn rows_written(&self) -> usize {
        self.sheets
            .iter()
            .map(|(_, outcome)| match outcome {
                SheetOutcome::Processed { rows_written } => *rows_written,
                SheetOutcome::Missing => 0,
            })
            .sum()
    }
}

/// Applies a price discount to workbooks in memory
#[derive(Debug, Clone, Copy)]
pub struct DiscountTransformer {
    discount: f64,
}

impl DiscountTransformer {
    pub fn new(discount: f64) -> DiscountResult<Self> {
        validate_discount(discount)?;
        Ok(Self { discount })
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn corrected_price(&self, price: f64) -> f64 {
        round_to(price * (1.0 - self.discount), 2)
    }

    /// Register the currency style unless the workbook already has it
    pub fn ensure_currency_style(workbook: &mut Workbook) -> bool {
        workbook.register_style(currency_style())
    }

    /// Process the requested sheets in order. Missing sheets are reported, not fatal.
    pub fn apply(&self, workbook: &mut Workbook, sheet_names: &[String]) -> Vec<(String, SheetOutcome)> {
        Self::ensure_currency_style(workbook);

        sheet_names
            .iter()
            .map(|name| {
                let outcome = match workbook.sheet_mut(name) {
                    Some(sheet) => SheetOutcome::Processed {
                        rows_written: self.apply_to_sheet(sheet),
                    },
                    None => SheetOutcome::Missing,
                };
                (name.clone(), outcome)
            })
            .collect()
    }

    /// Write corrected prices for every numeric price cell, then attach the chart.
    /// Returns the number of corrected prices written.
    pub fn apply_to_sheet(&self, sheet: &mut Sheet) -> usize {
        let max_row = sheet.max_row();
        let mut written = 0;

        for row in FIRST_DATA_ROW..=max_row {
            let Some(price) = sheet.cell(row, PRICE_COLUMN).and_then(|c| c.number()) else {
                continue;
            };
            let corrected = self.corrected_price(price);
            let cell = sheet.cell_mut(row, CORRECTED_PRICE_COLUMN);
            cell.value = corrected.into();
            cell.formula = None;
            cell.style = Some(CURRENCY_STYLE.to_string());
            written += 1;
        }

        let chart = corrected_price_chart(sheet);
        sheet.add_chart(chart);

        tracing::debug!(sheet = %sheet.name, rows = written, "applied discount");
        written
    }
}

/// Bar chart over the corrected price column, anchored two columns past the
/// sheet's rightmost used column at row 2
pub fn corrected_price_chart(sheet: &Sheet) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Bar,
        title: format!("Corrected Prices ({})", sheet.name),
        x_axis_title: "Items".to_string(),
        y_axis_title: "Price".to_string(),
        values: ColumnRange {
            column: CORRECTED_PRICE_COLUMN,
            first_row: FIRST_DATA_ROW,
            last_row: sheet.max_row().max(FIRST_DATA_ROW),
        },
        anchor: (FIRST_DATA_ROW, sheet.max_column() + 2),
    }
}

/// Load `path`, apply the discount to `sheet_names`, save to `output`.
///
/// Progress lines go to stdout. The workbook is dropped before returning on
/// every path.
pub fn transform_workbook(
    path: &Path,
    sheet_names: &[String],
    discount: f64,
    output: &Path,
) -> DiscountResult<TransformSummary> {
    if !path.exists() {
        return Err(DiscountError::NotFound(path.to_path_buf()));
    }
    let transformer = DiscountTransformer::new(discount)?;

    let mut workbook = load_workbook(path)?;
    let outcomes = transformer.apply(&mut workbook, sheet_names);

    for (name, outcome) in &outcomes {
        match outcome {
            SheetOutcome::Missing => {
                println!("Sheet \"{}\" does not exist. Skipping...", name);
            }
            SheetOutcome::Processed { .. } => {
                println!("Processing File \"{}\" Sheet \"{}\"...", path.display(), name);
            }
        }
    }

    save_workbook(&workbook, output)?;
    drop(workbook);

    println!("Processing complete. File saved as \"{}\"", output.display());
    tracing::info!(input = %path.display(), output = %output.display(), "workbook processed");

    Ok(TransformSummary {
        output: output.to_path_buf(),
        sheets: outcomes,
    })
}

/// Batch-safe variant of [`transform_workbook`]: any error, including a
/// missing input or a panic while handling the file, is printed as
/// `Error: <message>` and swallowed.
pub fn process_workbook(path: &Path, sheet_names: &[String], discount: f64, output: &Path) {
    run_isolated(path, || transform_workbook(path, sheet_names, discount, output));
}

/// Run `work` for `path`, reporting an error or panic instead of propagating it
fn run_isolated<T>(path: &Path, work: impl FnOnce() -> DiscountResult<T>) -> Option<T> {
    let message = match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };
    tracing::warn!(input = %path.display(), error = %message, "workbook failed");
    println!("Error: {}", message);
    None
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;
    use pretty_assertions::assert_eq;

    fn price_sheet(name: &str, prices: &[CellValue]) -> Sheet {
        let mut sheet = Sheet::new(name);
        sheet.append_row(["transaction_id", "product_id", "price"]);
        for (idx, price) in prices.iter().enumerate() {
            let row = sheet.append_row([CellValue::from(idx as f64 + 1.0), CellValue::from(5.0)]);
            sheet.set_value(row, PRICE_COLUMN, price.clone());
        }
        sheet
    }

    #[test]
    fn test_round_to_matches_reference() {
        assert_eq!(round_to(9.000000000000002, 2), 9.0);
        assert_eq!(round_to(12.3456, 2), 12.35);
        // 2.675 and 1.005 sit just below the tie in binary
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(1.005, 2), 1.0);
        assert_eq!(round_to(-3.14159, 2), -3.14);
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(0.0).is_ok());
        assert!(validate_discount(0.999).is_ok());
        assert!(validate_discount(1.0).is_err());
        assert!(validate_discount(-0.1).is_err());
        assert!(validate_discount(f64::NAN).is_err());
    }

    #[test]
    fn test_corrected_price() {
        let t = DiscountTransformer::new(0.1).unwrap();
        assert_eq!(t.corrected_price(10.0), 9.0);
        assert_eq!(t.corrected_price(20.0), 18.0);
        assert_eq!(t.corrected_price(19.99), 17.99);

        let none = DiscountTransformer::new(0.0).unwrap();
        assert_eq!(none.corrected_price(42.42), 42.42);
    }

    #[test]
    fn test_apply_to_sheet_writes_column_five() {
        let t = DiscountTransformer::new(0.1).unwrap();
        let mut sheet = price_sheet("Sheet1", &[10.0.into(), 20.0.into()]);

        assert_eq!(t.apply_to_sheet(&mut sheet), 2);

        let cell = sheet.cell(2, CORRECTED_PRICE_COLUMN).unwrap();
        assert_eq!(cell.value, CellValue::Number(9.0));
        assert_eq!(cell.style.as_deref(), Some(CURRENCY_STYLE));
        assert_eq!(sheet.value(3, CORRECTED_PRICE_COLUMN), &CellValue::Number(18.0));
        // price column untouched
        assert_eq!(sheet.value(2, PRICE_COLUMN), &CellValue::Number(10.0));
    }

    #[test]
    fn test_apply_to_sheet_skips_non_numeric() {
        let t = DiscountTransformer::new(0.5).unwrap();
        let mut sheet = price_sheet(
            "Sheet1",
            &[
                CellValue::Text("n/a".to_string()),
                4.0.into(),
                CellValue::Empty,
                CellValue::Bool(true),
            ],
        );

        assert_eq!(t.apply_to_sheet(&mut sheet), 1);
        assert!(sheet.cell(2, CORRECTED_PRICE_COLUMN).is_none());
        assert_eq!(sheet.value(3, CORRECTED_PRICE_COLUMN), &CellValue::Number(2.0));
        assert!(sheet.cell(4, CORRECTED_PRICE_COLUMN).is_none());
        assert!(sheet.cell(5, CORRECTED_PRICE_COLUMN).is_none());
    }

    #[test]
    fn test_header_row_is_never_written() {
        let t = DiscountTransformer::new(0.1).unwrap();
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(1, PRICE_COLUMN, 100.0);
        sheet.set_value(2, PRICE_COLUMN, 100.0);

        t.apply_to_sheet(&mut sheet);
        assert!(sheet.cell(1, CORRECTED_PRICE_COLUMN).is_none());
        assert_eq!(sheet.value(2, CORRECTED_PRICE_COLUMN), &CellValue::Number(90.0));
    }

    #[test]
    fn test_chart_layout() {
        let t = DiscountTransformer::new(0.1).unwrap();
        let mut sheet = price_sheet("Sheet1", &[10.0.into(), 20.0.into()]);
        t.apply_to_sheet(&mut sheet);

        assert_eq!(sheet.charts().len(), 1);
        let chart = &sheet.charts()[0];
        assert_eq!(chart.title, "Corrected Prices (Sheet1)");
        assert_eq!(chart.x_axis_title, "Items");
        assert_eq!(chart.y_axis_title, "Price");
        assert_eq!(
            chart.values,
            ColumnRange {
                column: 5,
                first_row: 2,
                last_row: 3
            }
        );
        // rightmost column is 5 after the row pass
        assert_eq!(chart.anchor, (2, 7));
    }

    #[test]
    fn test_chart_on_header_only_sheet() {
        let t = DiscountTransformer::new(0.1).unwrap();
        let mut sheet = price_sheet("Empty", &[]);
        assert_eq!(t.apply_to_sheet(&mut sheet), 0);

        let chart = &sheet.charts()[0];
        assert_eq!(chart.values.first_row, 2);
        assert_eq!(chart.values.last_row, 2);
        assert_eq!(chart.anchor, (2, 5));
    }

    #[test]
    fn test_apply_skips_missing_sheets() {
        let t = DiscountTransformer::new(0.1).unwrap();
        let mut wb = Workbook::new();
        wb.push_sheet(price_sheet("Sheet1", &[10.0.into()])).unwrap();
        wb.push_sheet(price_sheet("Sheet3", &[30.0.into()])).unwrap();

        let names = vec!["Sheet1".to_string(), "Sheet2".to_string(), "Sheet3".to_string()];
        let outcomes = t.apply(&mut wb, &names);

        assert_eq!(
            outcomes,
            vec![
                ("Sheet1".to_string(), SheetOutcome::Processed { rows_written: 1 }),
                ("Sheet2".to_string(), SheetOutcome::Missing),
                ("Sheet3".to_string(), SheetOutcome::Processed { rows_written: 1 }),
            ]
        );
        assert!(!wb.has_sheet("Sheet2"));
        assert_eq!(
            wb.sheet("Sheet3").unwrap().value(2, CORRECTED_PRICE_COLUMN),
            &CellValue::Number(27.0)
        );
    }

    #[test]
    fn test_apply_registers_style_once() {
        let t = DiscountTransformer::new(0.1).unwrap();
        let mut wb = Workbook::new();
        wb.push_sheet(price_sheet("Sheet1", &[10.0.into()])).unwrap();
        let names = vec!["Sheet1".to_string()];

        t.apply(&mut wb, &names);
        t.apply(&mut wb, &names);

        assert_eq!(wb.styles().count(), 1);
        assert_eq!(wb.style(CURRENCY_STYLE).unwrap().number_format, CURRENCY_FORMAT);
    }

    #[test]
    fn test_reapply_keeps_values() {
        let t = DiscountTransformer::new(0.25).unwrap();
        let mut sheet = price_sheet("Sheet1", &[8.0.into(), 3.33.into()]);

        t.apply_to_sheet(&mut sheet);
        let first: Vec<CellValue> = (2..=3)
            .map(|r| sheet.value(r, CORRECTED_PRICE_COLUMN).clone())
            .collect();
        t.apply_to_sheet(&mut sheet);
        let second: Vec<CellValue> = (2..=3)
            .map(|r| sheet.value(r, CORRECTED_PRICE_COLUMN).clone())
            .collect();

        assert_eq!(first, second);
        assert_eq!(first, vec![CellValue::Number(6.0), CellValue::Number(2.5)]);
    }

    #[test]
    fn test_run_isolated_reports_errors() {
        let path = Path::new("ghost.xlsx");
        let result: Option<()> =
            run_isolated(path, || Err(DiscountError::NotFound(path.to_path_buf())));
        assert!(result.is_none());
        assert_eq!(run_isolated(path, || Ok(7)), Some(7));
    }

    #[test]
    fn test_run_isolated_contains_panics() {
        let path = Path::new("broken.xlsx");
        let result: Option<()> = run_isolated(path, || panic!("malformed container"));
        assert!(result.is_none());

        let owned: Option<()> = run_isolated(path, || panic!("row {} out of range", 7));
        assert!(owned.is_none());
    }

    #[test]
    fn test_panic_message() {
        let from_str: Box<dyn Any + Send> = Box::new("bad zip");
        assert_eq!(panic_message(from_str.as_ref()), "bad zip");

        let from_string: Box<dyn Any + Send> = Box::new(format!("row {}", 3));
        assert_eq!(panic_message(from_string.as_ref()), "row 3");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_summary_counts() {
        let summary = TransformSummary {
            output: PathBuf::from("out.xlsx"),
            sheets: vec![
                ("A".to_string(), SheetOutcome::Processed { rows_written: 3 }),
                ("B".to_string(), SheetOutcome::Missing),
                ("C".to_string(), SheetOutcome::Processed { rows_written: 4 }),
            ],
        };
        assert_eq!(summary.processed_sheets(), 2);
        assert_eq!(summary.rows_written(), 7);
    }
}
