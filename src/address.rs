//! A1-style cell addressing
//!
//! Addresses are parsed into zero-based `(row, col)` coordinates. Columns run
//! from `A` to `XFD` and rows from 1 to 1,048,576, the limits of the xlsx
//! container. `$` absolute markers are accepted and ignored.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

static CELL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").expect("valid cell regex"));

static COLUMN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})$").expect("valid column regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("'{0}' is not an A1-style cell reference")]
    Malformed(String),

    #[error("column in '{0}' is beyond XFD")]
    ColumnOutOfRange(String),

    #[error("row in '{0}' is outside 1..=1048576")]
    RowOutOfRange(String),
}

/// Zero-based cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_label(self.col), self.row + 1)
    }
}

/// A rectangular range, normalized so `first` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub first: CellRef,
    pub last: CellRef,
}

impl CellRange {
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            first: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            last: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.first == self.last
    }

    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.first.row <= other.last.row
            && other.first.row <= self.last.row
            && self.first.col <= other.last.col
            && other.first.col <= self.last.col
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.first.row..=self.last.row).contains(&cell.row)
            && (self.first.col..=self.last.col).contains(&cell.col)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}:{}", self.first, self.last)
        }
    }
}

/// Parse an A1-style address such as `B7` or `$AA$10`
pub fn parse_cell(address: &str) -> Result<CellRef, AddressError> {
    let trimmed = address.trim();
    let caps = CELL_PATTERN
        .captures(trimmed)
        .ok_or_else(|| AddressError::Malformed(address.to_string()))?;

    let col = column_index(&caps[1]).ok_or_else(|| AddressError::ColumnOutOfRange(address.to_string()))?;

    let row: u32 = caps[2]
        .parse()
        .map_err(|_| AddressError::RowOutOfRange(address.to_string()))?;
    if row == 0 || row > MAX_ROWS {
        return Err(AddressError::RowOutOfRange(address.to_string()));
    }

    Ok(CellRef::new(row - 1, col))
}

/// Parse `A1:C3` (or a single cell `A1`) into a normalized range
pub fn parse_range(range: &str) -> Result<CellRange, AddressError> {
    match range.trim().split_once(':') {
        Some((start, end)) => Ok(CellRange::new(parse_cell(start)?, parse_cell(end)?)),
        None => {
            let cell = parse_cell(range)?;
            Ok(CellRange::new(cell, cell))
        }
    }
}

/// Parse a column label (`C`) or span (`B:D`) into inclusive zero-based bounds
pub fn parse_column_span(label: &str) -> Result<(u16, u16), AddressError> {
    let parse_one = |s: &str| -> Result<u16, AddressError> {
        let caps = COLUMN_PATTERN
            .captures(s.trim())
            .ok_or_else(|| AddressError::Malformed(label.to_string()))?;
        column_index(&caps[1]).ok_or_else(|| AddressError::ColumnOutOfRange(label.to_string()))
    };

    match label.split_once(':') {
        Some((first, last)) => {
            let (a, b) = (parse_one(first)?, parse_one(last)?);
            Ok((a.min(b), a.max(b)))
        }
        None => {
            let col = parse_one(label)?;
            Ok((col, col))
        }
    }
}

/// Convert a zero-based column index to its letters (0 → A, 26 → AA)
pub fn column_label(col: u16) -> String {
    let mut result = String::new();
    let mut n = u32::from(col) + 1;

    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }

    result
}

fn column_index(letters: &str) -> Option<u16> {
    let value = letters
        .bytes()
        .fold(0u32, |acc, b| acc * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1);
    if value == 0 || value > u32::from(MAX_COLS) {
        None
    } else {
        Some((value - 1) as u16)
    }
}
