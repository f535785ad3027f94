//! Core price transform

pub mod transformer;

pub use transformer::{
    corrected_price_chart, currency_style, process_workbook, round_to, transform_workbook,
    validate_discount, DiscountTransformer, SheetOutcome, TransformSummary, CORRECTED_PRICE_COLUMN,
    CURRENCY_FORMAT, CURRENCY_STYLE, FIRST_DATA_ROW, PRICE_COLUMN,
};
