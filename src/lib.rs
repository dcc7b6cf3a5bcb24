//! xlsx-reporting - fill Excel report templates from CSV and Excel inputs
//!
//! A YAML settings file names, per template workbook, which structured
//! tables and plain sheets receive which input data. Each table is resized
//! so its body holds exactly the new rows; every table below it on the same
//! sheet moves with it and its stored reference is kept in step.
//!
//! # Example
//!
//! ```no_run
//! use xlsx_reporting::core::{TableCatalog, replace_table_data};
//! use xlsx_reporting::excel::{InputLoader, XlsxDocument};
//! use xlsx_reporting::types::{DataSource, SourceKind};
//!
//! let mut doc = XlsxDocument::open("templates/report.xlsx")?;
//! let mut catalog = TableCatalog::load(&doc, "report.xlsx")?;
//!
//! let source = DataSource {
//!     file: "sales.csv".to_string(),
//!     kind: SourceKind::Csv,
//!     column_mapping: Vec::new(),
//!     column_types: Default::default(),
//! };
//! let data = InputLoader::new("inputs").load(&source)?;
//! replace_table_data(&mut doc, &mut catalog, "Sales", &data)?;
//! doc.save("outputs/report.xlsx")?;
//! # Ok::<(), xlsx_reporting::error::ReportError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod logging;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use error::{ReportError, ReportResult};
pub use types::{CellValue, DataSource, Frame, Settings, SourceKind};
