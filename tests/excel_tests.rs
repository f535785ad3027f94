//! Excel import/export round-trip tests

use calamine::{open_workbook, Data, Reader, Xlsx};
use pretty_assertions::assert_eq;
use sheet_discount::excel::{load_workbook, save_workbook, ExcelExporter, ExcelImporter};
use sheet_discount::types::{CellValue, NamedStyle, Workbook};
use sheet_discount::DiscountError;
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// IMPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_import_file_written_by_rust_xlsxwriter() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("input.xlsx");

    let mut book = rust_xlsxwriter::Workbook::new();
    let ws = book.add_worksheet();
    ws.set_name("Prices").unwrap();
    ws.write_string(0, 0, "transaction_id").unwrap();
    ws.write_string(0, 2, "price").unwrap();
    ws.write_number(1, 0, 1.0).unwrap();
    ws.write_number(1, 2, 12.5).unwrap();
    ws.write_boolean(2, 2, true).unwrap();
    book.add_worksheet().set_name("Other").unwrap();
    book.save(&path).unwrap();

    let wb = ExcelImporter::new(&path).import().unwrap();

    assert_eq!(wb.sheet_names(), vec!["Prices", "Other"]);
    let sheet = wb.sheet("Prices").unwrap();
    assert_eq!(sheet.value(1, 1), &CellValue::Text("transaction_id".to_string()));
    assert_eq!(sheet.value(2, 3), &CellValue::Number(12.5));
    assert_eq!(sheet.value(3, 3), &CellValue::Bool(true));
    assert_eq!(sheet.max_row(), 3);
    assert_eq!(sheet.max_column(), 3);
    assert!(wb.sheet("Other").unwrap().is_empty());
}

#[test]
fn test_import_reads_cell_number_formats() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("formatted.xlsx");

    let money = rust_xlsxwriter::Format::new().set_num_format("\"$\"#,##0.00");
    let percent = rust_xlsxwriter::Format::new().set_num_format("0.00%");
    let mut book = rust_xlsxwriter::Workbook::new();
    let ws = book.add_worksheet();
    ws.write_string(0, 2, "price").unwrap();
    ws.write_number_with_format(1, 2, 12.5, &money).unwrap();
    ws.write_number_with_format(1, 3, 0.25, &percent).unwrap();
    ws.write_number(1, 4, 3.0).unwrap();
    book.save(&path).unwrap();

    let wb = load_workbook(&path).unwrap();
    let sheet = wb.sheet("Sheet1").unwrap();

    let price_style = sheet.cell(2, 3).unwrap().style.as_deref().unwrap();
    assert_eq!(wb.style(price_style).unwrap().number_format, "\"$\"#,##0.00");
    let rate_style = sheet.cell(2, 4).unwrap().style.as_deref().unwrap();
    assert_eq!(wb.style(rate_style).unwrap().number_format, "0.00%");
    assert!(sheet.cell(2, 5).unwrap().style.is_none());
    assert!(sheet.cell(1, 3).unwrap().style.is_none());
    assert_eq!(wb.styles().count(), 2);
}

#[test]
fn test_round_trip_keeps_number_formats() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("formatted.xlsx");
    let output = temp_dir.path().join("formatted_copy.xlsx");

    let mut wb = Workbook::new();
    wb.register_style(NamedStyle::new("dollar_style", "\"$\"#,##0.00"));
    let sheet = wb.add_sheet("Sheet1").unwrap();
    sheet.set_value(1, 1, 4.25);
    sheet.set_style(1, 1, "dollar_style");
    save_workbook(&wb, &input).unwrap();

    save_workbook(&load_workbook(&input).unwrap(), &output).unwrap();

    let reloaded = load_workbook(&output).unwrap();
    let cell = reloaded.sheet("Sheet1").unwrap().cell(1, 1).unwrap();
    assert_eq!(cell.value, CellValue::Number(4.25));
    let style = reloaded.style(cell.style.as_deref().unwrap()).unwrap();
    assert_eq!(style.number_format, "\"$\"#,##0.00");
}

#[test]
fn test_import_data_not_starting_at_a1() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("offset.xlsx");

    let mut book = rust_xlsxwriter::Workbook::new();
    let ws = book.add_worksheet();
    ws.write_number(4, 2, 99.0).unwrap(); // C5
    book.save(&path).unwrap();

    let wb = load_workbook(&path).unwrap();
    let sheet = wb.sheet("Sheet1").unwrap();
    assert_eq!(sheet.value(5, 3), &CellValue::Number(99.0));
    assert_eq!(sheet.max_row(), 5);
}

#[test]
fn test_import_corrupt_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("corrupt.xlsx");
    std::fs::write(&path, b"definitely not a zip archive").unwrap();

    let err = load_workbook(&path).unwrap_err();
    assert!(matches!(err, DiscountError::Load(_)));
}

#[test]
fn test_import_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_workbook(temp_dir.path().join("nope.xlsx")).unwrap_err();
    assert!(matches!(err, DiscountError::NotFound(_)));
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_round_trip_values_and_sheet_order() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("round_trip.xlsx");

    let mut wb = Workbook::new();
    wb.register_style(NamedStyle::new("dollar_style", "\"$\"#,##0.00"));
    {
        let sheet = wb.add_sheet("Zeta").unwrap();
        sheet.append_row(["name", "qty", "price"]);
        sheet.append_row([
            CellValue::from("widget"),
            CellValue::from(3.0),
            CellValue::from(4.25),
        ]);
        sheet.set_style(2, 3, "dollar_style");
        sheet.set_value(3, 1, false);
        sheet.set_value(3, 2, CellValue::Error("#N/A".to_string()));
    }
    wb.add_sheet("Alpha").unwrap().set_value(1, 1, "only");

    save_workbook(&wb, &path).unwrap();

    let mut reader: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(reader.sheet_names(), vec!["Zeta".to_string(), "Alpha".to_string()]);

    let range = reader.worksheet_range("Zeta").unwrap();
    assert_eq!(range.get_value((1, 0)), Some(&Data::String("widget".to_string())));
    assert_eq!(range.get_value((1, 2)), Some(&Data::Float(4.25)));
    assert_eq!(range.get_value((2, 0)), Some(&Data::Bool(false)));
    assert_eq!(range.get_value((2, 1)), Some(&Data::String("#N/A".to_string())));
}

#[test]
fn test_round_trip_formulas() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("formulas.xlsx");
    let output = temp_dir.path().join("formulas_copy.xlsx");

    let mut book = rust_xlsxwriter::Workbook::new();
    let ws = book.add_worksheet();
    ws.write_number(0, 0, 2.0).unwrap();
    ws.write_formula(0, 1, "=A1*2").unwrap();
    book.save(&input).unwrap();

    let wb = load_workbook(&input).unwrap();
    let cell = wb.sheet("Sheet1").unwrap().cell(1, 2).unwrap();
    assert_eq!(cell.formula.as_deref(), Some("A1*2"));

    save_workbook(&wb, &output).unwrap();

    let mut reader: Xlsx<_> = open_workbook(&output).unwrap();
    let formulas = reader.worksheet_formula("Sheet1").unwrap();
    assert_eq!(formulas.get_value((0, 1)).map(String::as_str), Some("A1*2"));
}

#[test]
fn test_export_overwrites_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out.xlsx");
    std::fs::write(&path, b"stale").unwrap();

    let mut wb = Workbook::new();
    wb.add_sheet("Sheet1").unwrap().set_value(1, 1, 1.0);
    ExcelExporter::new(&wb).export(&path).unwrap();

    let reloaded = load_workbook(&path).unwrap();
    assert_eq!(reloaded.sheet("Sheet1").unwrap().value(1, 1), &CellValue::Number(1.0));
}

#[test]
fn test_export_empty_workbook() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.xlsx");

    // rust_xlsxwriter adds a default sheet when none exist
    save_workbook(&Workbook::new(), &path).unwrap();
    assert!(path.exists());
}
