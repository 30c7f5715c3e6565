//! A1-style addressing helpers.

use std::fmt;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;

use crate::conf::{N_COLS_EXCEL_MAX, N_ROWS_EXCEL_MAX};

const CELL_PATTERN: &str = r"^\$?([A-Za-z]{1,3})\$?([0-9]{1,7})$";

pub fn column_number_to_name(mut column: u32) -> String {
    // 1 -> A, 26 -> Z, 27 -> AA ...
    let mut name = String::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    name
}

pub fn column_name_to_number(name: &str) -> Result<u32> {
    if name.is_empty() || name.len() > 3 {
        bail!("invalid column letters: {name:?}");
    }
    let mut column = 0u32;
    for ch in name.chars() {
        if !ch.is_ascii_alphabetic() {
            bail!("invalid column letters: {name:?}");
        }
        column = column * 26 + u32::from(ch.to_ascii_uppercase() as u8 - b'A' + 1);
    }
    if column > N_COLS_EXCEL_MAX {
        bail!("column {name} is past the last Excel column");
    }
    Ok(column)
}

pub fn to_a1(col_1based: u32, row_1based: u32) -> String {
    format!("{}{}", column_number_to_name(col_1based), row_1based)
}

/// Parse `A3` / `$A$3` into `(row, col)`, both 1-based.
pub fn parse_cell(text: &str) -> Result<(u32, u32)> {
    let re = Regex::new(CELL_PATTERN).context("failed to compile cell pattern")?;
    let caps = re
        .captures(text.trim())
        .ok_or_else(|| anyhow!("not an A1 cell reference: {text:?}"))?;
    let col = column_name_to_number(&caps[1])?;
    let row: u32 = caps[2]
        .parse()
        .with_context(|| format!("bad row number in {text:?}"))?;
    if row == 0 || row > N_ROWS_EXCEL_MAX {
        bail!("row {row} out of range in {text:?}");
    }
    Ok((row, col))
}

/// Rectangular block of cells, corners inclusive and normalized so that
/// `first` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first: (u32, u32),
    pub last: (u32, u32),
}

impl CellRange {
    pub fn parse(text: &str) -> Result<Self> {
        let (a, b) = match text.split_once(':') {
            Some((a, b)) => (parse_cell(a)?, parse_cell(b)?),
            None => {
                let cell = parse_cell(text)?;
                (cell, cell)
            }
        };
        Ok(Self {
            first: (a.0.min(b.0), a.1.min(b.1)),
            last: (a.0.max(b.0), a.1.max(b.1)),
        })
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.first.0..=self.last.0).contains(&row) && (self.first.1..=self.last.1).contains(&col)
    }

    /// `$A$2:$A$5`, the form defined names are stored in.
    pub fn to_absolute(&self) -> String {
        let corner = |(row, col): (u32, u32)| format!("${}${}", column_number_to_name(col), row);
        if self.first == self.last {
            corner(self.first)
        } else {
            format!("{}:{}", corner(self.first), corner(self.last))
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = to_a1(self.first.1, self.first.0);
        if self.first == self.last {
            f.write_str(&first)
        } else {
            write!(f, "{first}:{}", to_a1(self.last.1, self.last.0))
        }
    }
}
