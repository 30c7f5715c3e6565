//! The HR estimate fixture: three sheets of literal data plus formula cells
//! that a spreadsheet application evaluates on open.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use crate::addr::column_number_to_name;
use crate::conf::{
    ARGB_DARK_RED, ARGB_GRAY, ARGB_LIGHT_BLUE, ARGB_LIGHT_GREEN, ARGB_ORANGE, ARGB_RED,
    DOC_AUTHOR, DOC_TITLE, FMT_ONE_DECIMAL, FMT_THOUSANDS, OUTPUT_FILE_NAME,
};
use crate::model::{
    BorderLine, CellValue, CompareOp, ConditionalFormatRule, DocProperties, Style, Workbook,
};
use crate::writer;

pub const SHEET_ESTIMATE: &str = "EstimateData";
pub const SHEET_DEPT: &str = "DeptSummary";
pub const SHEET_SETTINGS: &str = "Settings";

pub const ESTIMATE_HEADERS: [&str; 10] = [
    "No",
    "Name",
    "Dept",
    "Grade",
    "BaseSalary",
    "RoleAllow",
    "Commute",
    "Total",
    "MoM",
    "Note",
];
pub const ESTIMATE_SUB_HEADERS: [&str; 10] =
    ["", "", "", "", "(JPY)", "(JPY)", "(JPY)", "(JPY)", "(%)", ""];

/// One employee row: no, name, dept, grade, base salary, role allowance, commute.
pub type EmployeeRow = (u32, &'static str, &'static str, &'static str, u32, u32, u32);

pub const EMPLOYEES: [EmployeeRow; 10] = [
    (1, "Tanaka", "Sales", "M1", 350_000, 50_000, 15_000),
    (2, "Yamada", "HR", "S3", 280_000, 0, 20_000),
    (3, "Suzuki", "Tech", "E2", 320_000, 30_000, 12_000),
    (4, "Sato", "Sales", "M2", 380_000, 60_000, 18_000),
    (5, "Takahashi", "Admin", "S2", 260_000, 0, 10_000),
    (6, "Watanabe", "Tech", "E3", 340_000, 35_000, 25_000),
    (7, "Ito", "HR", "S1", 250_000, 0, 8_000),
    (8, "Nakamura", "Sales", "M1", 350_000, 50_000, 15_000),
    (9, "Kobayashi", "Tech", "E1", 300_000, 20_000, 22_000),
    (10, "Kato", "Admin", "S3", 280_000, 0, 10_000),
];

// rows 1-2 are headers
pub const FIRST_DATA_ROW: u32 = 3;
pub const TOTAL_ROW: u32 = FIRST_DATA_ROW + EMPLOYEES.len() as u32;
pub const BLANK_BLOCK_ROWS: std::ops::RangeInclusive<u32> = 15..=20;
pub const BLANK_BLOCK_COLS: std::ops::RangeInclusive<u32> = 1..=10;

pub const ESTIMATE_WIDTHS: [(&str, f64); 10] = [
    ("A", 5.0),
    ("B", 14.0),
    ("C", 8.0),
    ("D", 8.0),
    ("E", 12.0),
    ("F", 12.0),
    ("G", 12.0),
    ("H", 14.0),
    ("I", 8.0),
    ("J", 10.0),
];

pub const DEPT_HEADERS: [&str; 4] = ["Dept", "Count", "TotalCost", "AvgSalary"];
pub const DEPARTMENTS: [&str; 4] = ["Sales", "HR", "Tech", "Admin"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Text(&'static str),
    Number(f64),
}

pub const SETTINGS: [(&str, SettingValue); 5] = [
    ("CalcMonth", SettingValue::Text("2026-02")),
    ("TaxRate", SettingValue::Number(0.1)),
    ("InsuranceRate", SettingValue::Number(0.15)),
    ("CommuteLimit", SettingValue::Number(30_000.0)),
    ("Author", SettingValue::Text("BP_User")),
];

pub fn calc_month() -> Result<&'static str> {
    SETTINGS
        .iter()
        .find_map(|&(name, value)| match value {
            SettingValue::Text(month) if name == "CalcMonth" => Some(month),
            _ => None,
        })
        .ok_or_else(|| anyhow!("CalcMonth setting is missing"))
}

fn header_style() -> Style {
    Style::default().bold().fill(ARGB_LIGHT_BLUE)
}

fn thousands() -> Style {
    Style::default().number_format(FMT_THOUSANDS)
}

pub fn build_workbook() -> Result<Workbook> {
    let mut book = Workbook::new();
    build_estimate_data(&mut book).context("building EstimateData")?;
    build_dept_summary(&mut book).context("building DeptSummary")?;
    build_settings(&mut book).context("building Settings")?;
    book.set_properties(fixed_properties()?);
    Ok(book)
}

// Midnight on the first day of CalcMonth, so reruns carry the same properties.
fn fixed_properties() -> Result<DocProperties> {
    let month = calc_month()?;
    let first_day = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .with_context(|| format!("CalcMonth is not YYYY-MM: {month}"))?;
    let created = first_day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("invalid midnight for {first_day}"))?;
    Ok(DocProperties {
        creator: DOC_AUTHOR.to_string(),
        title: DOC_TITLE.to_string(),
        created,
    })
}

fn build_estimate_data(book: &mut Workbook) -> Result<()> {
    let sheet = book.add_sheet(SHEET_ESTIMATE)?;

    let header = header_style().bottom_border(BorderLine::Thin);
    for (col, label) in (1u32..).zip(ESTIMATE_HEADERS) {
        sheet.set_cell(1, col, CellValue::text(label), header.clone())?;
    }

    let sub_header = Style::default().fill(ARGB_LIGHT_GREEN);
    for (col, label) in (1u32..).zip(ESTIMATE_SUB_HEADERS) {
        let value = if label.is_empty() {
            CellValue::Empty
        } else {
            CellValue::text(label)
        };
        sheet.set_cell(2, col, value, sub_header.clone())?;
    }

    for (row, &(no, name, dept, grade, base, role, commute)) in
        (FIRST_DATA_ROW..).zip(EMPLOYEES.iter())
    {
        sheet.set_value(row, 1, CellValue::number(no))?;
        sheet.set_value(row, 2, CellValue::text(name))?;
        sheet.set_value(row, 3, CellValue::text(dept))?;
        sheet.set_value(row, 4, CellValue::text(grade))?;
        sheet.set_cell(row, 5, CellValue::number(base), thousands())?;
        sheet.set_cell(row, 6, CellValue::number(role), thousands())?;
        sheet.set_cell(row, 7, CellValue::number(commute), thousands())?;
        sheet.set_cell(row, 8, CellValue::formula(total_formula(row))?, thousands())?;
        sheet.set_cell(
            row,
            9,
            CellValue::formula(mom_formula(row))?,
            Style::default().number_format(FMT_ONE_DECIMAL),
        )?;
    }

    sheet.set_cell(TOTAL_ROW, 4, CellValue::text("Total"), Style::default().bold())?;
    let total_style = thousands().bold().fill(ARGB_ORANGE);
    for col in 5..=8 {
        sheet.set_cell(
            TOTAL_ROW,
            col,
            CellValue::formula(column_sum_formula(col))?,
            total_style.clone(),
        )?;
    }

    let gray = Style::default().fill(ARGB_GRAY);
    for row in BLANK_BLOCK_ROWS {
        for col in BLANK_BLOCK_COLS {
            sheet.set_style(row, col, gray.clone())?;
        }
    }

    let mom_range = format!(
        "I{FIRST_DATA_ROW}:I{}",
        FIRST_DATA_ROW + EMPLOYEES.len() as u32 - 1
    );
    sheet.add_conditional_format(ConditionalFormatRule::cell_is(
        &mom_range,
        CompareOp::GreaterThan,
        "2",
        Style::default().fill(ARGB_RED).font_color(ARGB_DARK_RED),
    )?);

    sheet.freeze_at(&format!("A{FIRST_DATA_ROW}"))?;

    for (letters, width) in ESTIMATE_WIDTHS {
        sheet.set_column_width(letters, width)?;
    }
    Ok(())
}

pub fn total_formula(row: u32) -> String {
    format!("=E{row}+F{row}+G{row}")
}

pub fn mom_formula(row: u32) -> String {
    format!("=ROUND((H{row}-H{row}*0.98)/H{row}*100,1)")
}

pub fn column_sum_formula(col: u32) -> String {
    let letters = column_number_to_name(col);
    format!(
        "=SUM({letters}{FIRST_DATA_ROW}:{letters}{})",
        TOTAL_ROW - 1
    )
}

fn build_dept_summary(book: &mut Workbook) -> Result<()> {
    let sheet = book.add_sheet(SHEET_DEPT)?;

    for (col, label) in (1u32..).zip(DEPT_HEADERS) {
        sheet.set_cell(1, col, CellValue::text(label), header_style())?;
    }

    for (row, dept) in (2u32..).zip(DEPARTMENTS) {
        sheet.set_value(row, 1, CellValue::text(dept))?;
        sheet.set_value(
            row,
            2,
            CellValue::formula(format!("=COUNTIF({SHEET_ESTIMATE}!C:C,A{row})"))?,
        )?;
        sheet.set_cell(
            row,
            3,
            CellValue::formula(format!(
                "=SUMIF({SHEET_ESTIMATE}!C:C,A{row},{SHEET_ESTIMATE}!H:H)"
            ))?,
            thousands(),
        )?;
        sheet.set_cell(
            row,
            4,
            CellValue::formula(format!("=IF(B{row}>0,C{row}/B{row},0)"))?,
            thousands(),
        )?;
    }

    for letters in ["A", "B", "C", "D"] {
        sheet.set_column_width(letters, 14.0)?;
    }

    let last_row = 1 + DEPARTMENTS.len() as u32;
    book.add_named_range("DeptMaster", SHEET_DEPT, &format!("A2:A{last_row}"))?;
    book.add_named_range("TotalCost", SHEET_DEPT, &format!("C2:C{last_row}"))?;
    Ok(())
}

fn build_settings(book: &mut Workbook) -> Result<()> {
    let sheet = book.add_sheet(SHEET_SETTINGS)?;

    let bold = Style::default().bold();
    sheet.set_cell(1, 1, CellValue::text("SettingName"), bold.clone())?;
    sheet.set_cell(1, 2, CellValue::text("Value"), bold)?;

    for (row, (name, value)) in (2u32..).zip(SETTINGS) {
        sheet.set_value(row, 1, CellValue::text(name))?;
        let value = match value {
            SettingValue::Text(text) => CellValue::text(text),
            SettingValue::Number(n) => CellValue::number(n),
        };
        sheet.set_value(row, 2, value)?;
    }

    sheet.set_column_width("A", 18.0)?;
    sheet.set_column_width("B", 14.0)?;
    Ok(())
}

pub fn default_output_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate the running executable")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow!("executable has no parent directory: {}", exe.display()))?;
    Ok(dir.join(OUTPUT_FILE_NAME))
}

pub fn summary_lines(output_path: &Path) -> Vec<String> {
    vec![
        format!("Test workbook created: {}", output_path.display()),
        format!(
            "  Sheet1: {SHEET_ESTIMATE} (freeze panes, formulas, conditional format, format-only empty cells)"
        ),
        format!("  Sheet2: {SHEET_DEPT} (cross-sheet formulas, named ranges)"),
        format!("  Sheet3: {SHEET_SETTINGS} (master data)"),
        "  Note: .xlsx format (no VBA). For VBA testing, use PS script on a PC with valid Excel license."
            .to_string(),
    ]
}

pub fn create_test_workbook(output_path: &Path) -> Result<()> {
    let book = build_workbook()?;
    writer::write_xlsx(&book, output_path)
}

pub fn run() -> Result<()> {
    let output_path = default_output_path()?;
    create_test_workbook(&output_path)?;
    for line in summary_lines(&output_path) {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_sheets_in_fixed_order() {
        let book = build_workbook().unwrap();
        assert_eq!(
            book.sheet_names(),
            vec![SHEET_ESTIMATE, SHEET_DEPT, SHEET_SETTINGS]
        );
    }

    #[test]
    fn derived_columns_reference_their_own_row() {
        let book = build_workbook().unwrap();
        let sheet = book.sheet(SHEET_ESTIMATE).unwrap();
        for row in 3..=12 {
            assert_eq!(
                sheet.cell(row, 8).unwrap().value,
                CellValue::Formula(format!("=E{row}+F{row}+G{row}"))
            );
            assert_eq!(
                sheet.cell(row, 9).unwrap().value,
                CellValue::Formula(format!("=ROUND((H{row}-H{row}*0.98)/H{row}*100,1)"))
            );
        }
    }

    #[test]
    fn total_row_sums_each_money_column() {
        let book = build_workbook().unwrap();
        let sheet = book.sheet(SHEET_ESTIMATE).unwrap();
        assert_eq!(TOTAL_ROW, 13);
        assert_eq!(sheet.cell(13, 4).unwrap().value, CellValue::text("Total"));
        for (col, letter) in (5..=8).zip(["E", "F", "G", "H"]) {
            let cell = sheet.cell(13, col).unwrap();
            assert_eq!(
                cell.value,
                CellValue::Formula(format!("=SUM({letter}3:{letter}12)"))
            );
            let style = cell.style.as_ref().unwrap();
            assert!(style.bold);
            assert_eq!(style.fill, Some(ARGB_ORANGE));
            assert_eq!(style.number_format, Some(FMT_THOUSANDS));
        }
    }

    #[test]
    fn blank_block_is_filled_without_values() {
        let book = build_workbook().unwrap();
        let sheet = book.sheet(SHEET_ESTIMATE).unwrap();
        for row in 15..=20 {
            for col in 1..=10 {
                let cell = sheet.cell(row, col).unwrap();
                assert!(cell.value.is_empty(), "({row}, {col}) has a value");
                assert_eq!(cell.style.as_ref().unwrap().fill, Some(ARGB_GRAY));
            }
        }
        assert!(sheet.cell(14, 1).is_none());
    }

    #[test]
    fn header_rows_carry_border_and_fills() {
        let book = build_workbook().unwrap();
        let sheet = book.sheet(SHEET_ESTIMATE).unwrap();
        for col in 1..=10 {
            let header = sheet.cell(1, col).unwrap().style.as_ref().unwrap();
            assert!(header.bold);
            assert_eq!(header.fill, Some(ARGB_LIGHT_BLUE));
            assert_eq!(header.bottom_border, Some(BorderLine::Thin));

            let sub = sheet.cell(2, col).unwrap().style.as_ref().unwrap();
            assert_eq!(sub.fill, Some(ARGB_LIGHT_GREEN));
        }
        for col in [1, 2, 3, 4, 10] {
            assert!(sheet.cell(2, col).unwrap().value.is_empty());
        }

        let dept = book.sheet(SHEET_DEPT).unwrap();
        for row in 2..=5 {
            for col in [3, 4] {
                let style = dept.cell(row, col).unwrap().style.as_ref().unwrap();
                assert_eq!(style.number_format, Some(FMT_THOUSANDS));
            }
        }

        let settings = book.sheet(SHEET_SETTINGS).unwrap();
        for col in [1, 2] {
            assert!(settings.cell(1, col).unwrap().style.as_ref().unwrap().bold);
        }
    }

    #[test]
    fn estimate_sheet_layout_metadata() {
        let book = build_workbook().unwrap();
        let sheet = book.sheet(SHEET_ESTIMATE).unwrap();
        assert_eq!(sheet.freeze_pane().unwrap().anchor(), "A3");

        let rules = sheet.conditional_formats();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].range.to_string(), "I3:I12");
        assert_eq!(rules[0].operator, CompareOp::GreaterThan);
        assert_eq!(rules[0].threshold, "2");
        assert_eq!(rules[0].style.fill, Some(ARGB_RED));
        assert_eq!(rules[0].style.font_color, Some(ARGB_DARK_RED));

        let widths: Vec<f64> = sheet.column_widths().map(|(_, w)| w).collect();
        assert_eq!(
            widths,
            vec![5.0, 14.0, 8.0, 8.0, 12.0, 12.0, 12.0, 14.0, 8.0, 10.0]
        );
    }

    #[test]
    fn dept_rows_point_at_estimate_columns() {
        let book = build_workbook().unwrap();
        let sheet = book.sheet(SHEET_DEPT).unwrap();
        for (row, dept) in (2..=5).zip(DEPARTMENTS) {
            assert_eq!(sheet.cell(row, 1).unwrap().value, CellValue::text(dept));
            assert_eq!(
                sheet.cell(row, 2).unwrap().value,
                CellValue::Formula(format!("=COUNTIF(EstimateData!C:C,A{row})"))
            );
            assert_eq!(
                sheet.cell(row, 3).unwrap().value,
                CellValue::Formula(format!(
                    "=SUMIF(EstimateData!C:C,A{row},EstimateData!H:H)"
                ))
            );
            assert_eq!(
                sheet.cell(row, 4).unwrap().value,
                CellValue::Formula(format!("=IF(B{row}>0,C{row}/B{row},0)"))
            );
        }
        assert_eq!(
            book.named_range("DeptMaster").unwrap().refers_to(),
            "DeptSummary!$A$2:$A$5"
        );
        assert_eq!(
            book.named_range("TotalCost").unwrap().refers_to(),
            "DeptSummary!$C$2:$C$5"
        );
    }

    #[test]
    fn settings_are_literals() {
        let book = build_workbook().unwrap();
        let sheet = book.sheet(SHEET_SETTINGS).unwrap();
        assert!(
            sheet
                .cells()
                .all(|(_, cell)| !matches!(cell.value, CellValue::Formula(_)))
        );
        assert_eq!(sheet.cell(2, 2).unwrap().value, CellValue::text("2026-02"));
        assert_eq!(sheet.cell(3, 2).unwrap().value, CellValue::Number(0.1));
        assert_eq!(sheet.cell(5, 2).unwrap().value, CellValue::Number(30_000.0));
        assert_eq!(sheet.cell(6, 1).unwrap().value, CellValue::text("Author"));
        assert!(sheet.cell(7, 1).is_none());
        assert_eq!(calc_month().unwrap(), "2026-02");
    }

    #[test]
    fn properties_pinned_to_calc_month() {
        let book = build_workbook().unwrap();
        let props = book.properties().unwrap();
        assert_eq!(props.creator, "BP_User");
        assert_eq!(
            props.created.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            "2026-02-01T00:00:00Z"
        );
    }

    #[test]
    fn rebuilding_yields_identical_model() {
        assert_eq!(build_workbook().unwrap(), build_workbook().unwrap());
    }

    #[test]
    fn summary_names_output_and_sheets() {
        let lines = summary_lines(Path::new("out.xlsx"));
        assert_eq!(lines[0], "Test workbook created: out.xlsx");
        assert!(lines[1].contains("EstimateData"));
        assert!(lines[4].contains("no VBA"));
    }
}
