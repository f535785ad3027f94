//! Synthetic transaction workbooks for testing the discount pipeline

use crate::core::{currency_style, round_to, CURRENCY_STYLE, PRICE_COLUMN};
use crate::error::{DiscountError, DiscountResult};
use crate::excel::save_workbook;
use crate::types::{CellValue, Workbook};
use rand::Rng;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// File name used when no output path is given
pub const DEFAULT_OUTPUT: &str = "transactions_generated.xlsx";
/// Data rows per generated sheet
pub const ROWS_PER_SHEET: usize = 100;

const HEADER: [&str; 3] = ["transaction_id", "product_id", "price"];

/// Builds workbooks of random transactions: one `SheetN` per sheet, a header
/// row and [`ROWS_PER_SHEET`] rows of `transaction_id, product_id, price`.
#[derive(Debug, Clone)]
pub struct SampleWorkbookGenerator {
    start_id: u64,
    product_ids: RangeInclusive<i64>,
    prices: RangeInclusive<f64>,
    sheet_count: usize,
    rows_per_sheet: usize,
    output: PathBuf,
}

impl SampleWorkbookGenerator {
    pub fn new(
        start_id: u64,
        product_ids: RangeInclusive<i64>,
        prices: RangeInclusive<f64>,
        sheet_count: usize,
    ) -> DiscountResult<Self> {
        if product_ids.start() > product_ids.end() {
            return Err(DiscountError::InvalidRange(format!(
                "product ids {}..={}",
                product_ids.start(),
                product_ids.end()
            )));
        }
        let (lo, hi) = (*prices.start(), *prices.end());
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(DiscountError::InvalidRange(format!("prices {}..={}", lo, hi)));
        }

        Ok(Self {
            start_id,
            product_ids,
            prices,
            sheet_count,
            rows_per_sheet: ROWS_PER_SHEET,
            output: PathBuf::from(DEFAULT_OUTPUT),
        })
    }

    pub fn with_output<P: AsRef<Path>>(mut self, output: P) -> Self {
        self.output = output.as_ref().to_path_buf();
        self
    }

    pub fn with_rows_per_sheet(mut self, rows: usize) -> Self {
        self.rows_per_sheet = rows;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the workbook in memory. Transaction ids continue across sheets,
    /// starting at `start_id + 1`.
    pub fn build<R: Rng>(&self, rng: &mut R) -> DiscountResult<Workbook> {
        let mut workbook = Workbook::new();
        workbook.register_style(currency_style());

        let mut transaction_id = self.start_id;
        for idx in 1..=self.sheet_count {
            let sheet = workbook.add_sheet(&format!("Sheet{}", idx))?;
            sheet.append_row(HEADER);

            for _ in 0..self.rows_per_sheet {
                transaction_id += 1;
                let product_id = rng.gen_range(self.product_ids.clone());
                let price = round_to(rng.gen_range(self.prices.clone()), 2);

                let row = sheet.append_row([
                    CellValue::from(transaction_id),
                    CellValue::from(product_id),
                    CellValue::from(price),
                ]);
                sheet.set_style(row, PRICE_COLUMN, CURRENCY_STYLE);
            }
        }

        Ok(workbook)
    }

    /// Build with `rng` and save to the configured output path
    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> DiscountResult<PathBuf> {
        let workbook = self.build(rng)?;
        save_workbook(&workbook, &self.output)?;
        println!("Test Excel generated and saved as {}", self.output.display());
        Ok(self.output.clone())
    }

    /// Build with the thread-local RNG and save
    pub fn generate(&self) -> DiscountResult<PathBuf> {
        self.generate_with(&mut rand::thread_rng())
    }
}

/// Generate `transactions_generated.xlsx` in the current directory
pub fn generate_excel(
    start_id: u64,
    product_ids: RangeInclusive<i64>,
    prices: RangeInclusive<f64>,
    sheet_count: usize,
) -> DiscountResult<PathBuf> {
    SampleWorkbookGenerator::new(start_id, product_ids, prices, sheet_count)?.generate()
}
