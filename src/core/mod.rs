//! Table engine: inventory, resizing, alignment, sheet replacement and the
//! per-template batch that drives them

pub mod aligner;
pub mod batch;
pub mod catalog;
pub mod resizer;
pub mod sheet_replacer;

pub use aligner::align;
pub use batch::{run, RunOptions, RunSummary, TemplateReport};
pub use catalog::{TableCatalog, TableDescriptor};
pub use resizer::{replace_table_data, resize, ResizePlan};
