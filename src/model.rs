//! In-memory workbook model.
//!
//! The model only records what should end up in the file. Formula cells keep
//! their text verbatim and are never evaluated here.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail};
use chrono::NaiveDateTime;

use crate::addr::{CellRange, column_name_to_number, column_number_to_name, parse_cell};
use crate::conf::{N_COLS_EXCEL_MAX, N_LEN_SHEET_NAME_MAX, N_ROWS_EXCEL_MAX, SHEET_NAME_ILLEGAL};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    /// Formula text including the leading `=`.
    Formula(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn number(value: impl Into<f64>) -> Self {
        Self::Number(value.into())
    }

    pub fn formula(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !text.starts_with('=') || text.len() < 2 {
            bail!("formula must start with '=': {text:?}");
        }
        Ok(Self::Formula(text))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderLine {
    Thin,
}

/// Cell or conditional-format style. Colors are ARGB hex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub font_color: Option<&'static str>,
    pub fill: Option<&'static str>,
    pub bottom_border: Option<BorderLine>,
    pub number_format: Option<&'static str>,
}

impl Style {
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn font_color(mut self, argb: &'static str) -> Self {
        self.font_color = Some(argb);
        self
    }

    pub fn fill(mut self, argb: &'static str) -> Self {
        self.fill = Some(argb);
        self
    }

    pub fn bottom_border(mut self, line: BorderLine) -> Self {
        self.bottom_border = Some(line);
        self
    }

    pub fn number_format(mut self, code: &'static str) -> Self {
        self.number_format = Some(code);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<Style>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Equal,
    NotEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFormatRule {
    pub range: CellRange,
    pub operator: CompareOp,
    pub threshold: String,
    pub style: Style,
}

impl ConditionalFormatRule {
    pub fn cell_is(range: &str, operator: CompareOp, threshold: &str, style: Style) -> Result<Self> {
        if threshold.trim().is_empty() {
            bail!("conditional format on {range} has an empty threshold");
        }
        Ok(Self {
            range: CellRange::parse(range)?,
            operator,
            threshold: threshold.to_string(),
            style,
        })
    }
}

/// Top-left cell of the scrolling region; everything above and left of it stays put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezePane {
    pub row: u32,
    pub col: u32,
}

impl FreezePane {
    pub fn frozen_rows(&self) -> u32 {
        self.row - 1
    }

    pub fn frozen_cols(&self) -> u32 {
        self.col - 1
    }

    pub fn anchor(&self) -> String {
        crate::addr::to_a1(self.col, self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRange {
    pub name: String,
    pub sheet: String,
    pub range: CellRange,
}

impl NamedRange {
    /// `Sheet!$A$2:$A$5`
    pub fn refers_to(&self) -> String {
        format!("{}!{}", quote_sheet_name(&self.sheet), self.range.to_absolute())
    }
}

fn quote_sheet_name(name: &str) -> String {
    let plain = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && parse_cell(name).is_err()
        && !reads_as_r1c1(name);
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

// R, C, R1C1, RC2 and friends.
fn reads_as_r1c1(name: &str) -> bool {
    let mut rest = name;
    let mut matched = false;
    for axis in ['R', 'C'] {
        if let Some(tail) = rest
            .strip_prefix(axis)
            .or_else(|| rest.strip_prefix(axis.to_ascii_lowercase()))
        {
            rest = tail.trim_start_matches(|c: char| c.is_ascii_digit());
            matched = true;
        }
    }
    matched && rest.is_empty()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u32), Cell>,
    conditional_formats: Vec<ConditionalFormatRule>,
    freeze: Option<FreezePane>,
    column_widths: BTreeMap<u32, f64>,
}

impl Sheet {
    fn new(name: String) -> Self {
        Self {
            name,
            cells: BTreeMap::new(),
            conditional_formats: Vec::new(),
            freeze: None,
            column_widths: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn cell_mut(&mut self, row: u32, col: u32) -> Result<&mut Cell> {
        if row == 0 || row > N_ROWS_EXCEL_MAX || col == 0 || col > N_COLS_EXCEL_MAX {
            bail!("cell ({row}, {col}) is outside the sheet {}", self.name);
        }
        Ok(self.cells.entry((row, col)).or_default())
    }

    pub fn set_value(&mut self, row: u32, col: u32, value: CellValue) -> Result<()> {
        self.cell_mut(row, col)?.value = value;
        Ok(())
    }

    pub fn set_style(&mut self, row: u32, col: u32, style: Style) -> Result<()> {
        self.cell_mut(row, col)?.style = Some(style);
        Ok(())
    }

    pub fn set_cell(&mut self, row: u32, col: u32, value: CellValue, style: Style) -> Result<()> {
        let cell = self.cell_mut(row, col)?;
        cell.value = value;
        cell.style = Some(style);
        Ok(())
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn cells(&self) -> impl Iterator<Item = ((u32, u32), &Cell)> {
        self.cells.iter().map(|(&pos, cell)| (pos, cell))
    }

    pub fn add_conditional_format(&mut self, rule: ConditionalFormatRule) {
        self.conditional_formats.push(rule);
    }

    pub fn conditional_formats(&self) -> &[ConditionalFormatRule] {
        &self.conditional_formats
    }

    pub fn freeze_at(&mut self, anchor: &str) -> Result<()> {
        let (row, col) = parse_cell(anchor)?;
        if row == 1 && col == 1 {
            bail!("freeze anchor A1 freezes nothing on sheet {}", self.name);
        }
        self.freeze = Some(FreezePane { row, col });
        Ok(())
    }

    pub fn freeze_pane(&self) -> Option<FreezePane> {
        self.freeze
    }

    pub fn set_column_width(&mut self, letters: &str, width: f64) -> Result<()> {
        if !(width > 0.0 && width <= 255.0) {
            bail!("column width {width} for {letters} must be in (0, 255]");
        }
        let col = column_name_to_number(letters)?;
        self.column_widths.insert(col, width);
        Ok(())
    }

    pub fn column_widths(&self) -> impl Iterator<Item = (String, f64)> + '_ {
        self.column_widths
            .iter()
            .map(|(&col, &width)| (column_number_to_name(col), width))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocProperties {
    pub creator: String,
    pub title: String,
    // also written as the modified time
    pub created: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    named_ranges: Vec<NamedRange>,
    properties: Option<DocProperties>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Sheet> {
        validate_sheet_name(name)?;
        if self.sheet(name).is_some() {
            bail!("duplicate sheet name: {name}");
        }
        self.sheets.push(Sheet::new(name.to_string()));
        let idx = self.sheets.len() - 1;
        Ok(&mut self.sheets[idx])
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        // Excel resolves sheet names ignoring case.
        self.sheets.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("no sheet named {name}"))
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }

    pub fn add_named_range(&mut self, name: &str, sheet: &str, range: &str) -> Result<()> {
        validate_defined_name(name)?;
        if self.named_range(name).is_some() {
            bail!("duplicate defined name: {name}");
        }
        let sheet = self
            .sheet(sheet)
            .ok_or_else(|| anyhow!("defined name {name} points at unknown sheet {sheet}"))?
            .name
            .clone();
        self.named_ranges.push(NamedRange {
            name: name.to_string(),
            sheet,
            range: CellRange::parse(range)?,
        });
        Ok(())
    }

    pub fn named_ranges(&self) -> &[NamedRange] {
        &self.named_ranges
    }

    pub fn named_range(&self, name: &str) -> Option<&NamedRange> {
        self.named_ranges
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }

    pub fn set_properties(&mut self, properties: DocProperties) {
        self.properties = Some(properties);
    }

    pub fn properties(&self) -> Option<&DocProperties> {
        self.properties.as_ref()
    }
}

fn validate_sheet_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > N_LEN_SHEET_NAME_MAX {
        bail!("sheet name {name:?} must be 1..={N_LEN_SHEET_NAME_MAX} characters");
    }
    if let Some(ch) = name.chars().find(|c| SHEET_NAME_ILLEGAL.contains(c)) {
        bail!("sheet name {name:?} contains illegal character {ch:?}");
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        bail!("sheet name {name:?} cannot begin or end with an apostrophe");
    }
    Ok(())
}

fn validate_defined_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        bail!("defined name is empty");
    };
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        bail!("defined name {name:?} must start with a letter, '_' or '\\'");
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        bail!("defined name {name:?} contains invalid characters");
    }
    // Names that read as cell references (e.g. "TAX1") are ambiguous in formulas.
    if parse_cell(name).is_ok() {
        bail!("defined name {name:?} collides with a cell reference");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_are_unique_ignoring_case() {
        let mut book = Workbook::new();
        book.add_sheet("Data").unwrap();
        assert!(book.add_sheet("DATA").is_err());
        assert!(book.add_sheet("a/b").is_err());
        assert!(book.add_sheet(&"x".repeat(32)).is_err());
        assert_eq!(book.sheet_names(), vec!["Data"]);

        book.sheet_mut("data")
            .unwrap()
            .set_value(1, 1, CellValue::text("x"))
            .unwrap();
        assert_eq!(book.sheet("Data").unwrap().cell(1, 1).unwrap().value, CellValue::text("x"));
        assert!(book.sheet_mut("Missing").is_err());
    }

    #[test]
    fn named_ranges_require_existing_sheet_and_unique_name() {
        let mut book = Workbook::new();
        book.add_sheet("DeptSummary").unwrap();
        book.add_named_range("DeptMaster", "DeptSummary", "A2:A5").unwrap();
        assert!(book.add_named_range("deptmaster", "DeptSummary", "B2:B5").is_err());
        assert!(book.add_named_range("Other", "Missing", "A1").is_err());
        assert!(book.add_named_range("AB12", "DeptSummary", "A1").is_err());
        assert_eq!(
            book.named_range("DeptMaster").unwrap().refers_to(),
            "DeptSummary!$A$2:$A$5"
        );
    }

    #[test]
    fn quoted_sheet_in_refers_to() {
        let mut book = Workbook::new();
        book.add_sheet("Dept Summary").unwrap();
        book.add_named_range("Depts", "Dept Summary", "A2:A5").unwrap();
        assert_eq!(
            book.named_range("Depts").unwrap().refers_to(),
            "'Dept Summary'!$A$2:$A$5"
        );
    }

    #[test]
    fn sheet_names_that_read_as_references_are_quoted() {
        let mut book = Workbook::new();
        for (sheet, expected) in [
            ("A1", "'A1'!$A$1"),
            ("R1C1", "'R1C1'!$A$1"),
            ("rc", "'rc'!$A$1"),
            ("2026", "'2026'!$A$1"),
            ("1Q", "'1Q'!$A$1"),
            ("Rates", "Rates!$A$1"),
            ("Calc2026", "Calc2026!$A$1"),
        ] {
            book.add_sheet(sheet).unwrap();
            let name = format!("N_{}", book.sheets().len());
            book.add_named_range(&name, sheet, "A1").unwrap();
            assert_eq!(book.named_range(&name).unwrap().refers_to(), expected);
        }
    }

    #[test]
    fn formula_must_carry_equals_sign() {
        assert!(CellValue::formula("SUM(A1:A2)").is_err());
        assert!(CellValue::formula("=").is_err());
        assert_eq!(
            CellValue::formula("=SUM(A1:A2)").unwrap(),
            CellValue::Formula("=SUM(A1:A2)".to_string())
        );
    }

    #[test]
    fn styled_empty_cell_keeps_no_value() {
        let mut book = Workbook::new();
        let sheet = book.add_sheet("S").unwrap();
        sheet.set_style(15, 1, Style::default().fill("FFF2F2F2")).unwrap();
        let cell = sheet.cell(15, 1).unwrap();
        assert!(cell.value.is_empty());
        assert_eq!(cell.style.as_ref().unwrap().fill, Some("FFF2F2F2"));
        assert!(sheet.set_value(0, 1, CellValue::number(1)).is_err());
    }

    #[test]
    fn freeze_anchor_derives_frozen_extent() {
        let mut book = Workbook::new();
        let sheet = book.add_sheet("S").unwrap();
        assert!(sheet.freeze_at("A1").is_err());
        sheet.freeze_at("A3").unwrap();
        let pane = sheet.freeze_pane().unwrap();
        assert_eq!((pane.frozen_rows(), pane.frozen_cols()), (2, 0));
        assert_eq!(pane.anchor(), "A3");
    }

    #[test]
    fn column_widths_iterate_in_column_order() {
        let mut book = Workbook::new();
        let sheet = book.add_sheet("S").unwrap();
        sheet.set_column_width("C", 8.0).unwrap();
        sheet.set_column_width("A", 5.0).unwrap();
        assert!(sheet.set_column_width("B", 0.0).is_err());
        let widths: Vec<_> = sheet.column_widths().collect();
        assert_eq!(widths, vec![("A".to_string(), 5.0), ("C".to_string(), 8.0)]);
    }
}
