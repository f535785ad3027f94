use crate::error::{DiscountError, DiscountResult};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

//==============================================================================
// Cells
//==============================================================================

/// Value held by a single cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Plain number (integers are stored as f64, as in the xlsx container)
    Number(f64),
    /// Text string
    Text(String),
    /// Boolean
    Bool(bool),
    /// Excel date/time serial number
    DateTime(f64),
    /// Error literal such as `#DIV/0!`
    Error(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Numeric payload of a `Number` value, `None` for every other variant
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// A cell: value, optional formula and optional named style reference
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    /// Formula text without the leading `=`; `value` holds the cached result
    pub formula: Option<String>,
    /// Name of a style registered in the owning workbook
    pub style: Option<String>,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            formula: None,
            style: None,
        }
    }

    /// Literal numeric value. Formula cells never count as numbers.
    pub fn number(&self) -> Option<f64> {
        if self.formula.is_some() {
            return None;
        }
        self.value.as_number()
    }
}

//==============================================================================
// Styles
//==============================================================================

/// Reusable, registered number format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedStyle {
    pub name: String,
    pub number_format: String,
}

impl NamedStyle {
    pub fn new(name: impl Into<String>, number_format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number_format: number_format.into(),
        }
    }
}

//==============================================================================
// Charts
//==============================================================================

/// Chart types the exporter knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Vertical bars (Excel "clustered column")
    Bar,
}

/// Contiguous single-column cell range, 1-indexed and inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    pub column: u32,
    pub first_row: u32,
    pub last_row: u32,
}

/// Chart attached to a sheet
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    /// Data source of the single series, on the owning sheet
    pub values: ColumnRange,
    /// Top-left anchor cell as (row, column), 1-indexed
    pub anchor: (u32, u32),
}

//==============================================================================
// Sheets
//==============================================================================

/// A single named grid. Cells are addressed by 1-indexed (row, column).
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(u32, u32), Cell>,
    charts: Vec<ChartSpec>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            charts: Vec::new(),
        }
    }

    pub fn cell(&self, row: u32, column: u32) -> Option<&Cell> {
        self.cells.get(&(row, column))
    }

    /// Value at (row, column), `Empty` when the cell was never written
    pub fn value(&self, row: u32, column: u32) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells
            .get(&(row, column))
            .map(|cell| &cell.value)
            .unwrap_or(&EMPTY)
    }

    /// Mutable cell, created empty on first access
    pub fn cell_mut(&mut self, row: u32, column: u32) -> &mut Cell {
        debug_assert!(row >= 1 && column >= 1, "cells are 1-indexed");
        self.cells.entry((row, column)).or_default()
    }

    pub fn set_value(&mut self, row: u32, column: u32, value: impl Into<CellValue>) {
        self.cell_mut(row, column).value = value.into();
    }

    pub fn set_style(&mut self, row: u32, column: u32, style: &str) {
        self.cell_mut(row, column).style = Some(style.to_string());
    }

    /// Insert a fully built cell, replacing whatever was there
    pub fn insert_cell(&mut self, row: u32, column: u32, cell: Cell) {
        self.cells.insert((row, column), cell);
    }

    /// Largest occupied row; 1 for an empty sheet
    pub fn max_row(&self) -> u32 {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(1)
    }

    /// Largest occupied column; 1 for an empty sheet
    pub fn max_column(&self) -> u32 {
        self.cells.keys().map(|(_, col)| *col).max().unwrap_or(1)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Write `values` into the row below the last occupied one (row 1 on an empty sheet).
    /// Returns the row number written.
    pub fn append_row<I, V>(&mut self, values: I) -> u32
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let row = if self.is_empty() { 1 } else { self.max_row() + 1 };
        for (idx, value) in values.into_iter().enumerate() {
            self.set_value(row, idx as u32 + 1, value);
        }
        row
    }

    /// Occupied cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = ((u32, u32), &Cell)> {
        self.cells.iter().map(|(pos, cell)| (*pos, cell))
    }

    pub fn add_chart(&mut self, chart: ChartSpec) {
        self.charts.push(chart);
    }

    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }
}

//==============================================================================
// Workbooks
//==============================================================================

/// Ordered collection of sheets plus a registry of named styles
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    styles: HashMap<String, NamedStyle>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new empty sheet. Sheet names are unique.
    pub fn add_sheet(&mut self, name: &str) -> DiscountResult<&mut Sheet> {
        if self.has_sheet(name) {
            return Err(DiscountError::DuplicateSheet(name.to_string()));
        }
        self.sheets.push(Sheet::new(name));
        let idx = self.sheets.len() - 1;
        Ok(&mut self.sheets[idx])
    }

    /// Append an already populated sheet
    pub fn push_sheet(&mut self, sheet: Sheet) -> DiscountResult<()> {
        if self.has_sheet(&sheet.name) {
            return Err(DiscountError::DuplicateSheet(sheet.name));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.iter().any(|s| s.name == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Register a named style. Returns `false` (and keeps the existing entry)
    /// when a style with the same name is already registered.
    pub fn register_style(&mut self, style: NamedStyle) -> bool {
        if self.styles.contains_key(&style.name) {
            return false;
        }
        self.styles.insert(style.name.clone(), style);
        true
    }

    pub fn has_style(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    pub fn style(&self, name: &str) -> Option<&NamedStyle> {
        self.styles.get(name)
    }

    pub fn styles(&self) -> impl Iterator<Item = &NamedStyle> {
        self.styles.values()
    }
}

//==============================================================================
// Jobs
//==============================================================================

/// Parameters for processing one workbook file
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountJob {
    pub input: PathBuf,
    pub sheet_names: Vec<String>,
    pub discount: f64,
    pub output: PathBuf,
}
