//! Plain-sheet replacement: rewrite everything below a sheet's header row.

use crate::error::{ReportError, ReportResult};
use crate::excel::document::Document;
use crate::excel::range::{column_letter, Coordinate};
use crate::types::Frame;
use tracing::{error, info};

const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;

/// Header texts of row 1, from column A to the sheet's last used column
pub fn sheet_header<D: Document>(doc: &D, sheet: &str) -> ReportResult<Vec<String>> {
    let last_column = doc.last_column(sheet)?.max(1);
    (1..=last_column)
        .map(|col| {
            doc.cell_text(sheet, Coordinate::new(HEADER_ROW, col))?
                .ok_or_else(|| ReportError::EmptyHeader {
                    sheet: sheet.to_string(),
                    column: format!("{}{}", column_letter(col), HEADER_ROW),
                })
        })
        .collect()
}

/// Replace the data region of `sheet` with `data`.
///
/// Header names must be matched exactly (case-sensitive); extra columns in
/// `data` are dropped. Rows 2 through the last used row are deleted and the
/// projected frame is written from row 2.
pub fn replace<D: Document>(doc: &mut D, sheet: &str, data: &Frame) -> ReportResult<()> {
    if !doc.has_sheet(sheet) {
        error!("Sheet '{}' not found", sheet);
        return Err(ReportError::SheetNotFound(sheet.to_string()));
    }

    let header = sheet_header(doc, sheet)?;
    let projected = data.select(&header, &format!("data for sheet '{}'", sheet)).map_err(|e| {
        error!("Cannot fill sheet '{}': {}", sheet, e);
        e
    })?;

    let last_row = doc.last_row(sheet)?;
    if last_row >= FIRST_DATA_ROW {
        doc.delete_rows(sheet, FIRST_DATA_ROW, last_row - FIRST_DATA_ROW + 1)?;
    }

    for (offset, row) in projected.rows.iter().enumerate() {
        let at_row = FIRST_DATA_ROW + offset as u32;
        for (col, value) in row.iter().enumerate() {
            doc.set_cell(sheet, Coordinate::new(at_row, col as u32 + 1), value)?;
        }
    }

    info!(
        "Replaced sheet '{}' with {} rows ({} previous rows removed)",
        sheet,
        projected.len(),
        last_row.saturating_sub(HEADER_ROW)
    );
    Ok(())
}
