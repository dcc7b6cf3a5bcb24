//! A1-style range references ("A1:C10") ↔ numeric extents

use crate::error::{ReportError, ReportResult};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Last column of an .xlsx worksheet (XFD)
pub const MAX_COLUMN: u32 = 16_384;
/// Last row of an .xlsx worksheet
pub const MAX_ROW: u32 = 1_048_576;

/// 1-based (row, column) cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    pub row: u32,
    pub col: u32,
}

impl Coordinate {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row)
    }
}

/// Inclusive rectangle, upper-left to lower-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: Coordinate,
    pub end: Coordinate,
}

impl CellRange {
    pub fn new(start: Coordinate, end: Coordinate) -> Self {
        Self { start, end }
    }

    /// Build from 1-based bounds: (start_row, start_col, end_row, end_col)
    pub fn from_bounds(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::new(
            Coordinate::new(start_row, start_col),
            Coordinate::new(end_row, end_col),
        )
    }

    /// Number of columns spanned
    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Rows below the header row
    pub fn data_rows(&self) -> u32 {
        self.end.row.saturating_sub(self.start.row)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for CellRange {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

fn cell_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\$?([A-Z]{1,3})\$?([1-9][0-9]{0,6})$").expect("hardcoded regex pattern")
    })
}

/// Parse "A1:C10" into a [`CellRange`].
///
/// Both halves must be present, each a column-letter/row-number pair inside the
/// worksheet limits, and the start must not lie below or right of the end.
pub fn decode(reference: &str) -> ReportResult<CellRange> {
    let malformed = || ReportError::MalformedRange(reference.to_string());

    let upper = reference.trim().to_ascii_uppercase();
    let (start, end) = upper.split_once(':').ok_or_else(malformed)?;
    let start = decode_cell(start).ok_or_else(malformed)?;
    let end = decode_cell(end).ok_or_else(malformed)?;

    if start.row > end.row || start.col > end.col {
        return Err(malformed());
    }

    Ok(CellRange::new(start, end))
}

/// Canonical "A1:C10" form. Inverse of [`decode`].
pub fn encode(range: &CellRange) -> String {
    range.to_string()
}

fn decode_cell(cell: &str) -> Option<Coordinate> {
    let captures = cell_pattern().captures(cell)?;
    let col = column_index(captures.get(1)?.as_str())?;
    let row: u32 = captures.get(2)?.as_str().parse().ok()?;
    if row > MAX_ROW || col > MAX_COLUMN {
        return None;
    }
    Some(Coordinate::new(row, col))
}

/// 1-based column number → letters (1 → "A", 27 → "AA")
pub fn column_letter(col: u32) -> String {
    let mut result = String::new();
    let mut idx = col.saturating_sub(1);

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Column letters → 1-based column number ("A" → 1, "AA" → 27)
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        acc.checked_mul(26)?.checked_add(c as u32 - 'A' as u32 + 1)
    })
}
