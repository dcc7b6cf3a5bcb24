//! Table inventory: where every structured table of a workbook lives.
//!
//! The catalog is the single source of truth for table ranges while a template
//! is being edited. Row shifts are applied here first as plain arithmetic; the
//! resizer then mirrors them into the document.

use crate::error::{ReportError, ReportResult};
use crate::excel::document::Document;
use crate::excel::range::{decode, CellRange, MAX_ROW};
use std::collections::BTreeSet;
use tracing::{debug, error, info};

/// Location of one structured table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub file: String,
    pub sheet: String,
    pub name: String,
    pub range: CellRange,
}

impl TableDescriptor {
    pub fn new(file: &str, sheet: &str, name: &str, range: CellRange) -> Self {
        Self {
            file: file.to_string(),
            sheet: sheet.to_string(),
            name: name.to_string(),
            range,
        }
    }

    /// Rows below the header
    pub fn data_rows(&self) -> u32 {
        self.range.data_rows()
    }

    fn label(&self) -> String {
        format!("{}!{}", self.sheet, self.name)
    }
}

/// Every table of one workbook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCatalog {
    tables: Vec<TableDescriptor>,
}

impl TableCatalog {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        Self { tables }
    }

    /// Record every structured table on every sheet of `doc`
    pub fn scan<D: Document>(doc: &D, file: &str) -> ReportResult<Self> {
        let mut tables = Vec::new();
        for sheet in doc.sheet_names() {
            for stored in doc.tables(&sheet)? {
                let range = decode(&stored.reference).map_err(|e| {
                    error!(
                        "Table '{}' on sheet '{}' has an unreadable reference '{}'",
                        stored.name, sheet, stored.reference
                    );
                    e
                })?;
                debug!("Found table '{}' on '{}' at {}", stored.name, sheet, range);
                tables.push(TableDescriptor::new(file, &sheet, &stored.name, range));
            }
        }
        info!("Found {} table(s) in {}", tables.len(), file);
        Ok(Self { tables })
    }

    /// Scan, sort and validate in one go
    pub fn load<D: Document>(doc: &D, file: &str) -> ReportResult<Self> {
        let mut catalog = Self::scan(doc, file)?;
        catalog.sort();
        catalog.validate()?;
        Ok(catalog)
    }

    /// Stable sort by (sheet, start row); defines "below" for the resizer
    pub fn sort(&mut self) {
        self.tables
            .sort_by(|a, b| (&a.sheet, a.range.start.row).cmp(&(&b.sheet, b.range.start.row)));
    }

    /// Check one file, distinct names, a body row per table, and no
    /// row-interval overlap between tables on the same sheet.
    pub fn validate(&self) -> ReportResult<()> {
        let files: BTreeSet<&str> = self.tables.iter().map(|t| t.file.as_str()).collect();
        if files.len() > 1 {
            let files: Vec<String> = files.into_iter().map(String::from).collect();
            error!("Table catalog references more than one file: {:?}", files);
            return Err(ReportError::MixedCatalogFiles(files));
        }

        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for table in &self.tables {
            if !seen.insert(table.name.as_str()) {
                duplicates.insert(table.name.clone());
            }
        }
        if !duplicates.is_empty() {
            let duplicates: Vec<String> = duplicates.into_iter().collect();
            error!("Duplicate table names: {:?}", duplicates);
            return Err(ReportError::DuplicateTableName(duplicates));
        }

        for table in &self.tables {
            if table.range.start.row >= table.range.end.row {
                error!("Table '{}' at {} has no body row", table.label(), table.range);
                return Err(ReportError::InvalidTableRange {
                    table: table.name.clone(),
                    range: table.range.to_string(),
                    reason: "start row must be above end row",
                });
            }
            if table.range.start.col > table.range.end.col {
                error!("Table '{}' at {} is inverted", table.label(), table.range);
                return Err(ReportError::InvalidTableRange {
                    table: table.name.clone(),
                    range: table.range.to_string(),
                    reason: "start column must not be right of end column",
                });
            }
        }

        let mut overlaps = Vec::new();
        for (i, a) in self.tables.iter().enumerate() {
            for b in &self.tables[i + 1..] {
                if a.sheet == b.sheet
                    && a.range.start.row <= b.range.end.row
                    && b.range.start.row <= a.range.end.row
                {
                    error!(
                        "Tables overlap: {} (rows {}-{}) and {} (rows {}-{})",
                        a.label(),
                        a.range.start.row,
                        a.range.end.row,
                        b.label(),
                        b.range.start.row,
                        b.range.end.row
                    );
                    overlaps.push((a.label(), b.label()));
                }
            }
        }
        if !overlaps.is_empty() {
            return Err(ReportError::OverlappingTables(overlaps));
        }

        debug!("Table catalog valid ({} tables)", self.tables.len());
        Ok(())
    }

    pub fn get(&self, name: &str) -> ReportResult<&TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| self.not_found(name))
    }

    fn not_found(&self, name: &str) -> ReportError {
        ReportError::TableNotFound(name.to_string(), self.names())
    }

    pub fn names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.iter()
    }

    /// Tables on `sheet` starting at or below `from_row`
    pub fn from_row<'a>(
        &'a self,
        sheet: &'a str,
        from_row: u32,
    ) -> impl Iterator<Item = &'a TableDescriptor> + 'a {
        self.tables
            .iter()
            .filter(move |t| t.sheet == sheet && t.range.start.row >= from_row)
    }

    /// Position of `name` in catalog order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Move the end row of `name` by `delta` and shift every other table on
    /// the same sheet whose start row is strictly below `name`'s start row.
    ///
    /// Tables above are untouched. A table never shifts itself. Either every
    /// affected range moves or, on error, none does.
    pub fn shift_rows(&mut self, name: &str, delta: i64) -> ReportResult<()> {
        if delta == 0 {
            return Ok(());
        }
        let idx = self.position(name).ok_or_else(|| self.not_found(name))?;
        let sheet = self.tables[idx].sheet.clone();
        let pivot = self.tables[idx].range.start.row;

        let new_end = offset_row(self.tables[idx].range.end.row, delta, name)?;
        if new_end <= pivot {
            return Err(ReportError::InvalidTableRange {
                table: name.to_string(),
                range: self.tables[idx].range.to_string(),
                reason: "row shift would remove the last body row",
            });
        }

        let mut moves = vec![(idx, pivot, new_end)];
        for (i, table) in self.tables.iter().enumerate() {
            if i != idx && table.sheet == sheet && table.range.start.row > pivot {
                moves.push((
                    i,
                    offset_row(table.range.start.row, delta, &table.name)?,
                    offset_row(table.range.end.row, delta, &table.name)?,
                ));
            }
        }

        for (i, start, end) in moves {
            self.tables[i].range.start.row = start;
            self.tables[i].range.end.row = end;
        }
        Ok(())
    }
}

fn offset_row(row: u32, delta: i64, table: &str) -> ReportResult<u32> {
    let shifted = i64::from(row) + delta;
    u32::try_from(shifted)
        .ok()
        .filter(|r| (1..=MAX_ROW).contains(r))
        .ok_or_else(|| {
            error!("Row shift of {} moves table '{}' to row {}", delta, table, shifted);
            ReportError::InvalidTableRange {
                table: table.to_string(),
                range: format!("row {}", shifted),
                reason: "row shift moved the table off the sheet",
            }
        })
}
