//! The live-workbook seam.
//!
//! The table engine only talks to a workbook through [`Document`]. The catalog
//! holds the authoritative table ranges; a document's own table references are
//! a cache the engine rewrites after every row shift.
//!
//! Unit tests run the engine against `MemoryDocument`, a sparse in-memory grid.

use crate::error::ReportResult;
use crate::excel::range::{CellRange, Coordinate};
use crate::types::CellValue;

/// A structured table as stored in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTable {
    pub name: String,
    /// A1-style reference, e.g. "A1:C10"
    pub reference: String,
}

/// Mutable spreadsheet document
pub trait Document {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names().iter().any(|s| s == sheet)
    }

    /// Structured tables defined on a sheet
    fn tables(&self, sheet: &str) -> ReportResult<Vec<StoredTable>>;

    /// Rewrite a table's stored reference.
    ///
    /// Fails with `TableNotFoundInDocument` when no table of that name exists
    /// on the sheet.
    fn set_table_ref(&mut self, sheet: &str, table: &str, range: &CellRange) -> ReportResult<()>;

    /// Insert `count` blank rows so the first new row is `at`
    fn insert_rows(&mut self, sheet: &str, at: u32, count: u32) -> ReportResult<()>;

    /// Delete `count` rows starting at `at`, moving later rows up
    fn delete_rows(&mut self, sheet: &str, at: u32, count: u32) -> ReportResult<()>;

    /// Cell content as text, `None` when blank
    fn cell_text(&self, sheet: &str, at: Coordinate) -> ReportResult<Option<String>>;

    fn set_cell(&mut self, sheet: &str, at: Coordinate, value: &CellValue) -> ReportResult<()>;

    /// Last used row (0 for an empty sheet)
    fn last_row(&self, sheet: &str) -> ReportResult<u32>;

    /// Last used column (0 for an empty sheet)
    fn last_column(&self, sheet: &str) -> ReportResult<u32>;
}

#[cfg(test)]
pub use memory::MemoryDocument;
