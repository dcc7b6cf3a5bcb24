//! Table resizing: make a structured table's body exactly fit new data.
//!
//! A resize always runs in the same order:
//!
//! 1. **Shrink** - delete every body row but one, starting right below the header
//! 2. **Anchor** - blank the single remaining body row
//! 3. **Grow** - insert `target - 1` rows after the anchor
//! 4. **Sync** - rewrite the stored reference of the table and every table below it
//! 5. **Write** - fill the body row-major (see [`write_rows`])
//!
//! Each row shift lands in the [`TableCatalog`] first; the document's own
//! table references are rewritten from the catalog afterwards.

use crate::core::aligner::align;
use crate::core::catalog::{TableCatalog, TableDescriptor};
use crate::error::{ReportError, ReportResult};
use crate::excel::document::Document;
use crate::excel::range::{column_letter, CellRange, Coordinate, MAX_ROW};
use crate::types::{CellValue, Frame};
use tracing::{debug, error, info, warn};

/// Row arithmetic of one resize, derived from the table range alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub header_row: u32,
    /// First body row; the one row kept through the shrink
    pub anchor_row: u32,
    /// Rows deleted at `anchor_row`
    pub rows_removed: u32,
    /// Rows inserted at `anchor_row + 1`
    pub rows_inserted: u32,
}

impl ResizePlan {
    /// Plan a resize of `range` to `target_rows` body rows.
    ///
    /// A table always keeps one body row, so a target of zero leaves a single
    /// blank anchor row.
    pub fn new(range: &CellRange, target_rows: usize) -> Self {
        let rows_inserted = u32::try_from(target_rows.saturating_sub(1)).unwrap_or(u32::MAX);
        Self {
            header_row: range.start.row,
            anchor_row: range.start.row + 1,
            rows_removed: range.end.row.saturating_sub(range.start.row + 1),
            rows_inserted,
        }
    }

    /// End row once the plan has been applied, `None` on overflow
    pub fn final_end_row(&self) -> Option<u32> {
        self.anchor_row.checked_add(self.rows_inserted)
    }

    pub fn is_noop(&self) -> bool {
        self.rows_removed == 0 && self.rows_inserted == 0
    }
}

/// Resize `table` on `sheet` to `target_rows` body rows.
///
/// Updates the catalog and the document together and returns the table's new
/// range. Tables that start below the target on the same sheet move with it;
/// tables above never move. A table present in the catalog but missing from
/// the document is logged and skipped during the reference sync.
pub fn resize<D: Document>(
    doc: &mut D,
    catalog: &mut TableCatalog,
    sheet: &str,
    table: &str,
    target_rows: usize,
) -> ReportResult<CellRange> {
    let descriptor = catalog.get(table)?.clone();
    if descriptor.sheet != sheet {
        error!(
            "Table '{}' is on sheet '{}', not '{}'",
            table, descriptor.sheet, sheet
        );
        return Err(ReportError::TableNotFound(table.to_string(), catalog.names()));
    }

    let plan = ResizePlan::new(&descriptor.range, target_rows);
    debug!("Resize plan for '{}' at {}: {:?}", table, descriptor.range, plan);

    // Shifts are checked against the sheet limits before the document is touched.
    let planned = plan_shifts(catalog, &descriptor, &plan)?;

    if plan.rows_removed > 0 {
        doc.delete_rows(sheet, plan.anchor_row, plan.rows_removed)?;
        info!(
            "Removed {} rows from table '{}', starting from row {} in sheet '{}'",
            plan.rows_removed, table, plan.anchor_row, sheet
        );
    }

    for col in descriptor.range.start.col..=descriptor.range.end.col {
        doc.set_cell(sheet, Coordinate::new(plan.anchor_row, col), &CellValue::Empty)?;
    }

    if plan.rows_inserted > 0 {
        doc.insert_rows(sheet, plan.anchor_row + 1, plan.rows_inserted)?;
        info!(
            "Added {} rows to table '{}' from row {} onwards in sheet '{}'",
            plan.rows_inserted,
            table,
            plan.anchor_row + 1,
            sheet
        );
    }

    *catalog = planned;
    if !plan.is_noop() {
        sync_references(doc, catalog, sheet, plan.header_row)?;
    }

    Ok(catalog.get(table)?.range)
}

/// Catalog as it will be after `plan`, or the error that rules the plan out
fn plan_shifts(
    catalog: &TableCatalog,
    descriptor: &TableDescriptor,
    plan: &ResizePlan,
) -> ReportResult<TableCatalog> {
    let too_large = || {
        error!(
            "Resizing table '{}' at {} to {} body rows would pass row {}",
            descriptor.name,
            descriptor.range,
            u64::from(plan.rows_inserted) + 1,
            MAX_ROW
        );
        ReportError::InvalidTableRange {
            table: descriptor.name.clone(),
            range: descriptor.range.to_string(),
            reason: "resized table would extend past the last sheet row",
        }
    };
    if plan.final_end_row().map_or(true, |end| end > MAX_ROW) {
        return Err(too_large());
    }

    let mut planned = catalog.clone();
    planned.shift_rows(&descriptor.name, -i64::from(plan.rows_removed))?;
    planned.shift_rows(&descriptor.name, i64::from(plan.rows_inserted))?;
    debug_assert_eq!(
        Some(planned.get(&descriptor.name)?.range.end.row),
        plan.final_end_row()
    );
    Ok(planned)
}

/// Rewrite the stored reference of every table on `sheet` starting at or
/// below `from_row` from the catalog.
pub fn sync_references<D: Document>(
    doc: &mut D,
    catalog: &TableCatalog,
    sheet: &str,
    from_row: u32,
) -> ReportResult<()> {
    for descriptor in catalog.from_row(sheet, from_row) {
        match doc.set_table_ref(sheet, &descriptor.name, &descriptor.range) {
            Ok(()) => info!(
                "Updated table '{}' reference to {}",
                descriptor.name, descriptor.range
            ),
            Err(e @ ReportError::TableNotFoundInDocument { .. }) => {
                warn!("{}, skipping reference update", e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Write `data` into the body of `table`, row-major from the first body row.
///
/// Rows beyond the table body and columns beyond its width are not written.
pub fn write_rows<D: Document>(
    doc: &mut D,
    catalog: &TableCatalog,
    table: &str,
    data: &Frame,
) -> ReportResult<()> {
    let descriptor = catalog.get(table)?;
    let range = descriptor.range;
    let body_rows = range.data_rows() as usize;
    let width = range.width() as usize;

    for row_offset in 0..data.len().min(body_rows) {
        let row = range.start.row + 1 + row_offset as u32;
        for col_offset in 0..width.min(data.width()) {
            let at = Coordinate::new(row, range.start.col + col_offset as u32);
            doc.set_cell(&descriptor.sheet, at, data.value(row_offset, col_offset))?;
        }
    }
    Ok(())
}

/// Header cell texts of a table, left to right
pub fn read_header<D: Document>(doc: &D, descriptor: &TableDescriptor) -> ReportResult<Vec<String>> {
    let range = descriptor.range;
    (range.start.col..=range.end.col)
        .map(|col| {
            doc.cell_text(&descriptor.sheet, Coordinate::new(range.start.row, col))?
                .ok_or_else(|| ReportError::EmptyHeader {
                    sheet: descriptor.sheet.clone(),
                    column: format!("{}{}", column_letter(col), range.start.row),
                })
        })
        .collect()
}

/// Replace the whole body of `table` with `data`: align, resize, write.
pub fn replace_table_data<D: Document>(
    doc: &mut D,
    catalog: &mut TableCatalog,
    table: &str,
    data: &Frame,
) -> ReportResult<CellRange> {
    info!("Replacing data in table '{}'", table);
    let descriptor = catalog.get(table)?.clone();

    let result = (|| -> ReportResult<CellRange> {
        let header = read_header(doc, &descriptor)?;
        let aligned = align(&header, data)?;
        let range = resize(doc, catalog, &descriptor.sheet, table, aligned.len())?;
        write_rows(doc, catalog, table, &aligned)?;
        Ok(range)
    })();

    match result {
        Ok(range) => {
            info!(
                "Updated table '{}' on sheet '{}': {} -> {} ({} rows)",
                table,
                descriptor.sheet,
                descriptor.range,
                range,
                data.len()
            );
            Ok(range)
        }
        Err(e) => {
            error!(
                "Failed to update table '{}' on sheet '{}' (rows {}-{}): {}",
                table, descriptor.sheet, descriptor.range.start.row, descriptor.range.end.row, e
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::document::MemoryDocument;
    use crate::excel::range::decode;
    use pretty_assertions::assert_eq;

    /// Sheet "Report" with T1 at A1:B4 and T2 at A6:B9, bodies filled
    fn report_doc() -> MemoryDocument {
        let mut doc = MemoryDocument::new();
        doc.add_sheet("Report");
        doc.add_table("Report", "T1", "A1:B4", &["Name", "Value"]).unwrap();
        doc.add_table("Report", "T2", "A6:B9", &["Key", "Amount"]).unwrap();
        for row in 2..=4 {
            doc.set_cell("Report", Coordinate::new(row, 1), &CellValue::Text(format!("old{}", row)))
                .unwrap();
            doc.set_cell("Report", Coordinate::new(row, 2), &CellValue::Number(row as f64))
                .unwrap();
        }
        for row in 7..=9 {
            doc.set_cell("Report", Coordinate::new(row, 1), &CellValue::Text(format!("k{}", row)))
                .unwrap();
        }
        doc
    }

    fn frame(columns: &[&str], rows: usize) -> Frame {
        let mut f = Frame::new(columns.iter().map(|c| c.to_string()).collect());
        for i in 0..rows {
            f.push_row(vec![
                CellValue::Text(format!("n{}", i)),
                CellValue::Number(i as f64 * 10.0),
            ]);
        }
        f
    }

    fn text(doc: &MemoryDocument, row: u32, col: u32) -> Option<String> {
        doc.cell_text("Report", Coordinate::new(row, col)).unwrap()
    }

    #[test]
    fn test_plan_arithmetic() {
        let plan = ResizePlan::new(&decode("A5:B10").unwrap(), 6);
        assert_eq!(
            plan,
            ResizePlan {
                header_row: 5,
                anchor_row: 6,
                rows_removed: 4,
                rows_inserted: 5,
            }
        );
        assert_eq!(plan.final_end_row(), Some(11));

        let single = ResizePlan::new(&decode("A5:B6").unwrap(), 1);
        assert!(single.is_noop());

        let empty = ResizePlan::new(&decode("A5:B9").unwrap(), 0);
        assert_eq!(empty.rows_inserted, 0);
        assert_eq!(empty.final_end_row(), Some(6));

        let huge = ResizePlan::new(&decode("A5:B9").unwrap(), usize::MAX);
        assert_eq!(huge.final_end_row(), None);
    }

    #[test]
    fn test_resize_grows_and_shifts_table_below() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();

        let range = resize(&mut doc, &mut catalog, "Report", "T1", 5).unwrap();
        assert_eq!(range.to_string(), "A1:B6");
        assert_eq!(catalog.get("T2").unwrap().range.to_string(), "A8:B11");
        assert_eq!(doc.table_ref("Report", "T1").as_deref(), Some("A1:B6"));
        assert_eq!(doc.table_ref("Report", "T2").as_deref(), Some("A8:B11"));

        // T2 content moved with its range
        assert_eq!(text(&doc, 8, 1).as_deref(), Some("Key"));
        assert_eq!(text(&doc, 9, 1).as_deref(), Some("k7"));
        assert_eq!(text(&doc, 11, 1).as_deref(), Some("k9"));
    }

    #[test]
    fn test_resize_clears_stale_body() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();

        resize(&mut doc, &mut catalog, "Report", "T1", 3).unwrap();
        assert_eq!(catalog.get("T1").unwrap().range.to_string(), "A1:B4");
        for row in 2..=4 {
            assert_eq!(text(&doc, row, 1), None);
            assert_eq!(text(&doc, row, 2), None);
        }
        assert_eq!(text(&doc, 1, 1).as_deref(), Some("Name"));
        assert_eq!(catalog.get("T2").unwrap().range.to_string(), "A6:B9");
    }

    #[test]
    fn test_resize_to_zero_keeps_anchor_row() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();

        let range = resize(&mut doc, &mut catalog, "Report", "T1", 0).unwrap();
        assert_eq!(range.to_string(), "A1:B2");
        assert_eq!(doc.table_ref("Report", "T2").as_deref(), Some("A4:B7"));
        assert_eq!(text(&doc, 2, 1), None);
    }

    #[test]
    fn test_resize_bottom_table_leaves_top_alone() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();

        resize(&mut doc, &mut catalog, "Report", "T2", 10).unwrap();
        assert_eq!(catalog.get("T1").unwrap().range.to_string(), "A1:B4");
        assert_eq!(catalog.get("T2").unwrap().range.to_string(), "A6:B16");
        assert_eq!(text(&doc, 2, 1).as_deref(), Some("old2"));
    }

    #[test]
    fn test_resize_past_last_row_leaves_document_alone() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();
        let before = catalog.clone();

        let err = resize(&mut doc, &mut catalog, "Report", "T1", MAX_ROW as usize).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTableRange { ref table, .. } if table == "T1"));
        assert_eq!(catalog, before);
        assert_eq!(doc.table_ref("Report", "T1").as_deref(), Some("A1:B4"));
        assert_eq!(doc.table_ref("Report", "T2").as_deref(), Some("A6:B9"));
        assert_eq!(text(&doc, 2, 1).as_deref(), Some("old2"));
        assert_eq!(text(&doc, 7, 1).as_deref(), Some("k7"));
    }

    #[test]
    fn test_resize_rejects_pushing_lower_table_off_sheet() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();

        // T1 itself still fits; T2 would end one row past the sheet
        let rows = (MAX_ROW - 5) as usize;
        let err = resize(&mut doc, &mut catalog, "Report", "T1", rows).unwrap_err();
        assert!(matches!(err, ReportError::InvalidTableRange { ref table, .. } if table == "T2"));
        assert_eq!(doc.table_ref("Report", "T1").as_deref(), Some("A1:B4"));
        assert_eq!(catalog.get("T2").unwrap().range.to_string(), "A6:B9");
    }

    #[test]
    fn test_resize_to_last_row_round_trips() {
        let mut doc = MemoryDocument::new();
        doc.add_sheet("S");
        doc.add_table("S", "T", "A1:B3", &["a", "b"]).unwrap();
        let mut catalog = TableCatalog::load(&doc, "f.xlsx").unwrap();

        let range = resize(&mut doc, &mut catalog, "S", "T", (MAX_ROW - 1) as usize).unwrap();
        assert_eq!(range.end.row, MAX_ROW);
        let stored = doc.table_ref("S", "T").unwrap();
        assert_eq!(decode(&stored).unwrap(), range);
    }

    #[test]
    fn test_resize_wrong_sheet() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();
        let err = resize(&mut doc, &mut catalog, "Other", "T1", 2).unwrap_err();
        assert!(matches!(err, ReportError::TableNotFound(..)));
    }

    #[test]
    fn test_resize_skips_table_missing_from_document() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();
        doc.remove_table("Report", "T2").unwrap();

        let range = resize(&mut doc, &mut catalog, "Report", "T1", 4).unwrap();
        assert_eq!(range.to_string(), "A1:B5");
        assert_eq!(doc.table_ref("Report", "T1").as_deref(), Some("A1:B5"));
        assert_eq!(catalog.get("T2").unwrap().range.to_string(), "A7:B10");
    }

    #[test]
    fn test_replace_table_data_end_to_end() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();

        let data = frame(&["name", "VALUE"], 5);
        let range = replace_table_data(&mut doc, &mut catalog, "T1", &data).unwrap();
        assert_eq!(range.to_string(), "A1:B6");
        assert_eq!(doc.table_ref("Report", "T2").as_deref(), Some("A8:B11"));

        for i in 0..5u32 {
            assert_eq!(text(&doc, 2 + i, 1), Some(format!("n{}", i)));
            assert_eq!(
                doc.value("Report", Coordinate::new(2 + i, 2)),
                CellValue::Number(i as f64 * 10.0)
            );
        }
        assert_eq!(text(&doc, 1, 2).as_deref(), Some("Value"));

        // re-scanning agrees with the catalog
        let rescanned = TableCatalog::load(&doc, "report.xlsx").unwrap();
        assert_eq!(rescanned, catalog);
        assert_eq!(rescanned.get("T1").unwrap().data_rows(), 5);
    }

    #[test]
    fn test_replace_table_data_missing_column_leaves_document() {
        let mut doc = report_doc();
        let mut catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();
        let before = catalog.clone();

        let data = frame(&["name", "other"], 2);
        let err = replace_table_data(&mut doc, &mut catalog, "T1", &data).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumns { .. }));
        assert_eq!(catalog, before);
        assert_eq!(text(&doc, 2, 1).as_deref(), Some("old2"));
    }

    #[test]
    fn test_read_header_empty_cell() {
        let mut doc = MemoryDocument::new();
        doc.add_sheet("S");
        doc.add_table("S", "T", "A1:C3", &["a", "", "c"]).unwrap();
        let catalog = TableCatalog::load(&doc, "f.xlsx").unwrap();
        let err = read_header(&doc, catalog.get("T").unwrap()).unwrap_err();
        match err {
            ReportError::EmptyHeader { column, .. } => assert_eq!(column, "B1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_rows_clips_to_body() {
        let mut doc = report_doc();
        let catalog = TableCatalog::load(&doc, "report.xlsx").unwrap();
        write_rows(&mut doc, &catalog, "T1", &frame(&["Name", "Value"], 10)).unwrap();
        assert_eq!(text(&doc, 4, 1).as_deref(), Some("n2"));
        assert_eq!(text(&doc, 5, 1), None);
        assert_eq!(text(&doc, 6, 1).as_deref(), Some("Key"));
    }
}
