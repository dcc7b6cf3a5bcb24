//! Match an input frame's columns onto a table's header

use crate::error::{ReportError, ReportResult};
use crate::types::Frame;
use tracing::error;

/// Select and reorder `data`'s columns to exactly `table_columns`.
///
/// Matching is case-insensitive. The result carries the table's original
/// header casing and `data`'s row order; extra input columns are dropped.
/// Every unmatched table column is reported in one `MissingColumns` error.
pub fn align(table_columns: &[String], data: &Frame) -> ReportResult<Frame> {
    let lowered: Vec<String> = data.columns.iter().map(|c| c.to_lowercase()).collect();

    let mut indices = Vec::with_capacity(table_columns.len());
    let mut missing = Vec::new();
    for column in table_columns {
        let wanted = column.to_lowercase();
        match lowered.iter().position(|c| *c == wanted) {
            Some(idx) => indices.push(idx),
            None => missing.push(column.clone()),
        }
    }

    if !missing.is_empty() {
        error!(
            "Input data is missing table columns {:?} (has {:?})",
            missing, data.columns
        );
        return Err(ReportError::MissingColumns {
            context: "input data".to_string(),
            missing,
        });
    }

    Ok(Frame {
        columns: table_columns.to_vec(),
        rows: data
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect(),
    })
}
