//! Workbook access
//!
//! - `range`: A1-style range codec
//! - `document`: the [`Document`] seam (plus an in-memory grid for unit tests)
//! - `workbook`: .xlsx templates opened for editing (umya-spreadsheet)
//! - `importer`: input frames from CSV and Excel files (csv, calamine)

pub mod document;
pub mod importer;
pub mod range;
pub mod workbook;

pub use document::{Document, StoredTable};
#[cfg(test)]
pub use document::MemoryDocument;
pub use importer::InputLoader;
pub use range::{decode, encode, CellRange, Coordinate};
pub use workbook::XlsxDocument;
