//! Plain-text dump of a workbook's content, read back with calamine.
//!
//! Only content is captured: sheet order, cell text, formula text and
//! defined names. Styles and zip metadata are ignored, so two runs of the
//! generator can be compared with `==`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::addr::{parse_cell, to_a1};

fn datatype_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            if n.fract() == 0.0 {
                format!("{:.0}", n)
            } else {
                n.to_string()
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("{e:?}"),
        other => format!("{other:?}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSnapshot {
    pub name: String,
    /// `(row, col)` 1-based → rendered text; formulas carry a leading `=`.
    pub cells: BTreeMap<(u32, u32), String>,
}

impl SheetSnapshot {
    pub fn get(&self, a1: &str) -> Option<&str> {
        let pos = parse_cell(a1).ok()?;
        self.cells.get(&pos).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookSnapshot {
    pub sheets: Vec<SheetSnapshot>,
    /// `(name, refers_to)` as stored in the workbook part.
    pub defined_names: Vec<(String, String)>,
}

impl WorkbookSnapshot {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetSnapshot> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn defined_name(&self, name: &str) -> Option<&str> {
        self.defined_names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, refers_to)| refers_to.as_str())
    }
}

impl fmt::Display for WorkbookSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sheet in &self.sheets {
            writeln!(f, "[{}]", sheet.name)?;
            for (&(row, col), text) in &sheet.cells {
                writeln!(f, "{} = {}", to_a1(col, row), text)?;
            }
        }
        if !self.defined_names.is_empty() {
            writeln!(f, "[defined names]")?;
            for (name, refers_to) in &self.defined_names {
                writeln!(f, "{name} = {refers_to}")?;
            }
        }
        Ok(())
    }
}

fn collect_used<T, F>(range: &Range<T>, out: &mut BTreeMap<(u32, u32), String>, render: F)
where
    T: calamine::CellType,
    F: Fn(&T) -> String,
{
    let Some((row0, col0)) = range.start() else {
        return;
    };
    for (row, col, value) in range.used_cells() {
        let text = render(value);
        if text.is_empty() {
            continue;
        }
        let pos = (row0 + row as u32 + 1, col0 + col as u32 + 1);
        out.insert(pos, text);
    }
}

pub fn snapshot(path: &Path) -> Result<WorkbookSnapshot> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;

    let defined_names = workbook.defined_names().to_vec();
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let values = workbook
            .worksheet_range(&name)
            .with_context(|| format!("failed to read sheet: {name}"))?;
        let formulas = workbook
            .worksheet_formula(&name)
            .with_context(|| format!("failed to read formulas of sheet: {name}"))?;

        let mut cells = BTreeMap::new();
        collect_used(&values, &mut cells, datatype_to_string);
        // Formula text wins over whatever cached value sits in the cell.
        collect_used(&formulas, &mut cells, |f: &String| format!("={f}"));
        sheets.push(SheetSnapshot { name, cells });
    }

    Ok(WorkbookSnapshot {
        sheets,
        defined_names,
    })
}

/// Entry point of `dump_workbook <file.xlsx>`.
pub fn run(args: impl IntoIterator<Item = std::ffi::OsString>) -> Result<()> {
    let mut args = args.into_iter();
    let _exe = args.next();

    let Some(input) = args.next() else {
        println!("usage: dump_workbook <file.xlsx>");
        return Ok(());
    };

    let snap = snapshot(Path::new(&input))?;
    print!("{snap}");
    Ok(())
}
