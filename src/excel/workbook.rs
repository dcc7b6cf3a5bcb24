//! .xlsx template documents backed by umya-spreadsheet

use crate::error::{ReportError, ReportResult};
use crate::excel::document::{Document, StoredTable};
use crate::excel::range::{column_letter, CellRange, Coordinate};
use crate::types::CellValue;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// A row insertion or deletion on one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEdit {
    Insert { at: u32, count: u32 },
    Delete { at: u32, count: u32 },
}

impl RowEdit {
    /// New position of a single row, `None` when it was deleted
    fn row(self, row: u32) -> Option<u32> {
        match self {
            RowEdit::Insert { at, count } if row >= at => Some(row + count),
            RowEdit::Insert { .. } => Some(row),
            RowEdit::Delete { at, count } if row >= at + count => Some(row - count),
            RowEdit::Delete { at, .. } if row >= at => None,
            RowEdit::Delete { .. } => Some(row),
        }
    }

    /// New rows of an inclusive span; a span losing all its rows is `None`
    fn span(self, first: u32, last: u32) -> Option<(u32, u32)> {
        match self {
            RowEdit::Insert { .. } => Some((self.row(first)?, self.row(last)?)),
            RowEdit::Delete { at, count } => {
                let first = self.row(first).unwrap_or(at);
                let last = self.row(last).unwrap_or(at.saturating_sub(1));
                (last >= first).then_some((first, last))
            }
        }
    }
}

fn sheet_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"('(?:[^']|'')+'|[A-Za-z_][A-Za-z0-9_.]*)!(\$?[A-Z]{1,3}\$?)([0-9]+)(?::(\$?[A-Z]{1,3}\$?)([0-9]+))?",
        )
        .expect("hardcoded regex pattern")
    })
}

fn names_sheet(sheet_part: &str, sheet: &str) -> bool {
    match sheet_part
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
    {
        Some(quoted) => quoted.replace("''", "'") == sheet,
        None => sheet_part == sheet,
    }
}

/// Move the row numbers of every `sheet!A1` / `sheet!A1:B2` reference in
/// `formula` to follow `edit`. References whose rows were all deleted become
/// `sheet!#REF!`. Returns `None` when the formula does not change.
pub fn shift_formula_rows(formula: &str, sheet: &str, edit: RowEdit) -> Option<String> {
    let rewritten = sheet_ref_regex().replace_all(formula, |caps: &Captures| {
        let sheet_part = &caps[1];
        if !names_sheet(sheet_part, sheet) {
            return caps[0].to_string();
        }
        let first: u32 = caps[3].parse().unwrap_or(0);
        match caps.get(5) {
            Some(last) => {
                let last: u32 = last.as_str().parse().unwrap_or(0);
                match edit.span(first, last) {
                    Some((a, b)) => format!("{}!{}{}:{}{}", sheet_part, &caps[2], a, &caps[4], b),
                    None => format!("{}!#REF!", sheet_part),
                }
            }
            None => match edit.row(first) {
                Some(row) => format!("{}!{}{}", sheet_part, &caps[2], row),
                None => format!("{}!#REF!", sheet_part),
            },
        }
    });
    (rewritten != formula).then(|| rewritten.into_owned())
}

/// An opened workbook, held exclusively while one template is processed
pub struct XlsxDocument {
    book: Spreadsheet,
    path: PathBuf,
}

impl XlsxDocument {
    /// Open an .xlsx file for editing
    pub fn open<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ReportError::MissingPath {
                kind: "workbook",
                path: path.display().to_string(),
            });
        }
        let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| {
            ReportError::Xlsx(format!("Failed to open {}: {}", path.display(), e))
        })?;
        debug!("Opened workbook {}", path.display());
        Ok(Self {
            book,
            path: path.to_path_buf(),
        })
    }

    /// Path the document was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the workbook, overwriting any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ReportResult<()> {
        let path = path.as_ref();
        umya_spreadsheet::writer::xlsx::write(&self.book, path).map_err(|e| {
            ReportError::Xlsx(format!("Failed to save {}: {}", path.display(), e))
        })?;
        debug!("Saved workbook {}", path.display());
        Ok(())
    }

    /// Formula text of a cell, `None` for plain values
    pub fn cell_formula(&self, sheet: &str, at: Coordinate) -> ReportResult<Option<String>> {
        Ok(self
            .sheet(sheet)?
            .get_cell((at.col, at.row))
            .filter(|cell| cell.is_formula())
            .map(|cell| cell.get_formula().to_string()))
    }

    /// umya moves references on the edited sheet itself; formulas on the
    /// other sheets that point into it are rewritten here.
    fn shift_foreign_formulas(&mut self, sheet: &str, edit: RowEdit) {
        for other in self.book.get_sheet_collection_mut().iter_mut() {
            if other.get_name() == sheet {
                continue;
            }
            let other_name = other.get_name().to_string();
            for cell in other.get_cell_collection_mut() {
                if !cell.is_formula() {
                    continue;
                }
                if let Some(formula) = shift_formula_rows(cell.get_formula(), sheet, edit) {
                    debug!("Rewrote formula on '{}' to {}", other_name, formula);
                    cell.set_formula(formula);
                }
            }
        }
    }

    fn sheet(&self, name: &str) -> ReportResult<&Worksheet> {
        self.book
            .get_sheet_by_name(name)
            .ok_or_else(|| ReportError::SheetNotFound(name.to_string()))
    }

    fn sheet_mut(&mut self, name: &str) -> ReportResult<&mut Worksheet> {
        self.book
            .get_sheet_by_name_mut(name)
            .ok_or_else(|| ReportError::SheetNotFound(name.to_string()))
    }
}

impl Document for XlsxDocument {
    fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection_no_check()
            .iter()
            .map(|s| s.get_name().to_string())
            .collect()
    }

    fn tables(&self, sheet: &str) -> ReportResult<Vec<StoredTable>> {
        Ok(self
            .sheet(sheet)?
            .get_tables()
            .iter()
            .map(|table| {
                let (start, end) = table.get_area();
                StoredTable {
                    name: table.get_name().to_string(),
                    reference: format!(
                        "{}{}:{}{}",
                        column_letter(*start.get_col_num()),
                        start.get_row_num(),
                        column_letter(*end.get_col_num()),
                        end.get_row_num()
                    ),
                }
            })
            .collect())
    }

    fn set_table_ref(&mut self, sheet: &str, table: &str, range: &CellRange) -> ReportResult<()> {
        let stored = self
            .sheet_mut(sheet)?
            .get_tables_mut()
            .iter_mut()
            .find(|t| t.get_name() == table)
            .ok_or_else(|| ReportError::TableNotFoundInDocument {
                sheet: sheet.to_string(),
                table: table.to_string(),
            })?;
        stored.set_area((
            (range.start.col, range.start.row),
            (range.end.col, range.end.row),
        ));
        Ok(())
    }

    fn insert_rows(&mut self, sheet: &str, at: u32, count: u32) -> ReportResult<()> {
        self.sheet_mut(sheet)?.insert_new_row(&at, &count);
        self.shift_foreign_formulas(sheet, RowEdit::Insert { at, count });
        Ok(())
    }

    fn delete_rows(&mut self, sheet: &str, at: u32, count: u32) -> ReportResult<()> {
        self.sheet_mut(sheet)?.remove_row(&at, &count);
        self.shift_foreign_formulas(sheet, RowEdit::Delete { at, count });
        Ok(())
    }

    fn cell_text(&self, sheet: &str, at: Coordinate) -> ReportResult<Option<String>> {
        Ok(self
            .sheet(sheet)?
            .get_cell((at.col, at.row))
            .map(|cell| cell.get_value().to_string())
            .filter(|value| !value.is_empty()))
    }

    fn set_cell(&mut self, sheet: &str, at: Coordinate, value: &CellValue) -> ReportResult<()> {
        let cell = self.sheet_mut(sheet)?.get_cell_mut((at.col, at.row));
        cell.get_cell_value_mut().remove_formula();
        match value {
            CellValue::Empty => {
                cell.set_value(String::new());
            }
            CellValue::Number(n) => {
                cell.set_value_number(*n);
            }
            CellValue::Text(s) => {
                cell.set_value_string(s.clone());
            }
            CellValue::Bool(b) => {
                cell.set_value_bool(*b);
            }
        }
        Ok(())
    }

    fn last_row(&self, sheet: &str) -> ReportResult<u32> {
        Ok(self.sheet(sheet)?.get_highest_row())
    }

    fn last_column(&self, sheet: &str) -> ReportResult<u32> {
        Ok(self.sheet(sheet)?.get_highest_column())
    }
}
