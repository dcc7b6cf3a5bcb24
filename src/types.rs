use crate::error::{ReportError, ReportResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

//==============================================================================
// Tabular data
//==============================================================================

/// A single cell value moved between input frames and the template
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Infer a typed value from raw text (CSV fields)
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => CellValue::Bool(true),
            "false" => CellValue::Bool(false),
            _ => CellValue::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Rows × named columns, row order preserved from the source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the frame width
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at (row, col), `Empty` when out of bounds
    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Keep exactly `names`, in that order. Every name must exist.
    pub fn select(&self, names: &[String], context: &str) -> ReportResult<Frame> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(ReportError::MissingColumns {
                context: context.to_string(),
                missing,
            });
        }

        Ok(Frame {
            columns: names.to_vec(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Rename columns old → new; unmapped columns keep their names
    pub fn rename(mut self, mapping: &[(String, String)]) -> Frame {
        for column in &mut self.columns {
            if let Some((_, new)) = mapping.iter().find(|(old, _)| old == column) {
                *column = new.clone();
            }
        }
        self
    }
}

//==============================================================================
// Settings (YAML)
//==============================================================================

/// Top-level settings file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub output_from_input_dict: BTreeMap<String, RawTemplateOutputs>,
}

/// Per-template outputs as written in YAML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTemplateOutputs {
    #[serde(default)]
    pub tables: BTreeMap<String, serde_yaml::Mapping>,
    #[serde(default)]
    pub sheets: BTreeMap<String, serde_yaml::Mapping>,
}

/// Validated settings
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub templates: BTreeMap<String, TemplateOutputs>,
}

/// What to write into one template: table name → source, sheet name → source
#[derive(Debug, Clone, Default)]
pub struct TemplateOutputs {
    pub tables: BTreeMap<String, DataSource>,
    pub sheets: BTreeMap<String, DataSource>,
}

/// Where a frame comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Csv,
    ExcelSheet { name: String },
    ExcelTable { name: String },
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Csv => write!(f, "csv"),
            SourceKind::ExcelSheet { name } => write!(f, "sheet '{}'", name),
            SourceKind::ExcelTable { name } => write!(f, "table '{}'", name),
        }
    }
}

/// One declared input: file, what to read from it, and how to reshape it
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub file: String,
    pub kind: SourceKind,
    /// old name → new name, in declaration order
    pub column_mapping: Vec<(String, String)>,
    /// Declared but not enforced
    pub column_types: BTreeMap<String, String>,
}

impl DataSource {
    /// Columns that must exist in the loaded source
    pub fn declared_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = self
            .column_mapping
            .iter()
            .map(|(old, _)| old.clone())
            .collect();
        for name in self.column_types.keys() {
            if !cols.contains(name) {
                cols.push(name.clone());
            }
        }
        cols
    }

    /// Rename by the mapping and keep the mapped columns in mapping order
    pub fn project(&self, frame: Frame) -> ReportResult<Frame> {
        if self.column_mapping.is_empty() {
            return Ok(frame);
        }
        let final_columns: Vec<String> = self
            .column_mapping
            .iter()
            .map(|(_, new)| new.clone())
            .collect();
        frame
            .rename(&self.column_mapping)
            .select(&final_columns, &self.to_string())
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file, self.kind)
    }
}
