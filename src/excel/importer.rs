//! Input loading - CSV files, Excel sheets and Excel structured tables → [`Frame`]

use crate::error::{ReportError, ReportResult};
use crate::types::{CellValue, DataSource, Frame, SourceKind};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::collections::HashMap;
use std::io::BufReader;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Loads declared data sources from the input folder.
///
/// Each (file, sheet-or-table) is read once; later requests for the same
/// source are served from the cache and projected again.
pub struct InputLoader {
    folder: PathBuf,
    cache: HashMap<(String, SourceKind), Frame>,
}

impl InputLoader {
    pub fn new<P: AsRef<Path>>(folder: P) -> Self {
        Self {
            folder: folder.as_ref().to_path_buf(),
            cache: HashMap::new(),
        }
    }

    /// Load a source and return its final frame (renamed and projected)
    pub fn load(&mut self, source: &DataSource) -> ReportResult<Frame> {
        let key = (source.file.clone(), source.kind.clone());
        if !self.cache.contains_key(&key) {
            let frame = self.read(source)?;
            self.cache.insert(key.clone(), frame);
        }
        let raw = &self.cache[&key];

        let declared = source.declared_columns();
        let missing: Vec<String> = declared
            .into_iter()
            .filter(|c| raw.column_index(c).is_none())
            .collect();
        if !missing.is_empty() {
            error!("{} is missing declared columns {:?}", source, missing);
            return Err(ReportError::MissingColumns {
                context: source.to_string(),
                missing,
            });
        }

        source.project(raw.clone())
    }

    fn read(&self, source: &DataSource) -> ReportResult<Frame> {
        let path = self.folder.join(&source.file);
        if !path.is_file() {
            error!("Input file not found: {}", path.display());
            return Err(ReportError::MissingPath {
                kind: "input file",
                path: path.display().to_string(),
            });
        }

        info!("Loading {}", source);
        let frame = match &source.kind {
            SourceKind::Csv => read_csv(&path)?,
            SourceKind::ExcelSheet { name } => read_excel_sheet(&path, name)?,
            SourceKind::ExcelTable { name } => read_excel_table(&path, name)?,
        };
        debug!(
            "Loaded {} rows x {} columns from {}",
            frame.len(),
            frame.width(),
            source
        );
        Ok(frame)
    }
}

/// Read a CSV file; the first record is the header
pub fn read_csv(path: &Path) -> ReportResult<Frame> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut frame = Frame::new(columns);
    for record in reader.records() {
        let record = record?;
        frame.push_row(record.iter().map(CellValue::infer).collect());
    }
    Ok(frame)
}

fn open_xlsx(path: &Path) -> ReportResult<Xlsx<BufReader<File>>> {
    open_workbook(path).map_err(|e: calamine::XlsxError| {
        ReportError::Calamine(format!("Failed to open {}: {}", path.display(), e))
    })
}

/// Read a worksheet; the first row of the used range is the header
pub fn read_excel_sheet(path: &Path, sheet: &str) -> ReportResult<Frame> {
    let mut workbook = open_xlsx(path)?;
    if !workbook.sheet_names().iter().any(|s| s == sheet) {
        return Err(ReportError::SheetNotFound(sheet.to_string()));
    }
    let range = workbook.worksheet_range(sheet)?;
    Ok(range_to_frame(&range))
}

/// Read a structured table by name from whichever sheet holds it
pub fn read_excel_table(path: &Path, table: &str) -> ReportResult<Frame> {
    let mut workbook = open_xlsx(path)?;
    workbook.load_tables()?;

    let available: Vec<String> = workbook.table_names().into_iter().cloned().collect();
    if !available.iter().any(|t| t == table) {
        return Err(ReportError::TableNotFound(table.to_string(), available));
    }

    let table = workbook.table_by_name(table)?;
    let mut frame = Frame::new(table.columns().to_vec());
    for row in table.data().rows() {
        frame.push_row(row.iter().map(convert_cell).collect());
    }
    Ok(frame)
}

fn range_to_frame(range: &Range<Data>) -> Frame {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Frame::default();
    };

    let columns = header
        .iter()
        .enumerate()
        .map(|(col, cell)| match cell {
            Data::String(s) => s.clone(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => f.to_string(),
            _ => format!("col_{}", col),
        })
        .collect();

    let mut frame = Frame::new(columns);
    for row in rows {
        frame.push_row(row.iter().map(convert_cell).collect());
    }
    frame
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn csv_source(file: &str, mapping: &[(&str, &str)]) -> DataSource {
        DataSource {
            file: file.to_string(),
            kind: SourceKind::Csv,
            column_mapping: mapping
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            column_types: BTreeMap::new(),
        }
    }

    #[test]
    fn test_read_csv_infers_types() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, "region,amount,active\nEU,10.5,true\nUS,,false\n").unwrap();

        let frame = read_csv(&path).unwrap();
        assert_eq!(frame.columns, vec!["region", "amount", "active"]);
        assert_eq!(
            frame.rows,
            vec![
                vec![
                    CellValue::Text("EU".into()),
                    CellValue::Number(10.5),
                    CellValue::Bool(true)
                ],
                vec![
                    CellValue::Text("US".into()),
                    CellValue::Empty,
                    CellValue::Bool(false)
                ],
            ]
        );
    }

    #[test]
    fn test_loader_projects_mapping() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("in.csv"), "a,b,c\n1,2,3\n").unwrap();

        let mut loader = InputLoader::new(dir.path());
        let frame = loader
            .load(&csv_source("in.csv", &[("c", "C"), ("a", "A")]))
            .unwrap();
        assert_eq!(frame.columns, vec!["C", "A"]);
        assert_eq!(frame.rows[0], vec![CellValue::Number(3.0), CellValue::Number(1.0)]);
    }

    #[test]
    fn test_loader_caches_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "a\n1\n").unwrap();

        let mut loader = InputLoader::new(dir.path());
        let source = csv_source("in.csv", &[]);
        loader.load(&source).unwrap();
        std::fs::remove_file(&path).unwrap();
        let frame = loader.load(&source).unwrap();
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_loader_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut loader = InputLoader::new(dir.path());
        let err = loader.load(&csv_source("nope.csv", &[])).unwrap_err();
        assert!(matches!(err, ReportError::MissingPath { .. }));
    }

    #[test]
    fn test_loader_missing_declared_column() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("in.csv"), "a,b\n1,2\n").unwrap();
        let mut loader = InputLoader::new(dir.path());
        let err = loader
            .load(&csv_source("in.csv", &[("a", "A"), ("zz", "Z")]))
            .unwrap_err();
        match err {
            ReportError::MissingColumns { missing, .. } => assert_eq!(missing, vec!["zz"]),
            other => panic!("unexpected error: {other}"),
        }
    }
}
