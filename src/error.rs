use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel read error: {0}")]
    Calamine(String),

    #[error("Workbook error: {0}")]
    Xlsx(String),

    #[error("Malformed range reference '{0}'")]
    MalformedRange(String),

    #[error("Duplicate table names: {}", .0.join(", "))]
    DuplicateTableName(Vec<String>),

    #[error("Overlapping tables: {}", format_pairs(.0))]
    OverlappingTables(Vec<(String, String)>),

    #[error("Table catalog spans more than one file: {}", .0.join(", "))]
    MixedCatalogFiles(Vec<String>),

    #[error("Table '{table}' has an invalid range {range}: {reason}")]
    InvalidTableRange {
        table: String,
        range: String,
        reason: &'static str,
    },

    #[error("Table '{0}' not found. Available tables: {}", .1.join(", "))]
    TableNotFound(String, Vec<String>),

    #[error("Table '{table}' not found in worksheet '{sheet}'")]
    TableNotFoundInDocument { sheet: String, table: String },

    #[error("Missing required columns {missing:?} in {context}")]
    MissingColumns {
        context: String,
        missing: Vec<String>,
    },

    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("Sheet '{sheet}' has an empty header cell in column {column}")]
    EmptyHeader { sheet: String, column: String },

    #[error("Unsupported source type: {0}")]
    UnsupportedSourceType(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing {kind}: {path}")]
    MissingPath { kind: &'static str, path: String },

    #[error("Invalid report date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

fn format_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(a, b)| format!("{} <-> {}", a, b))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<calamine::XlsxError> for ReportError {
    fn from(e: calamine::XlsxError) -> Self {
        ReportError::Calamine(e.to_string())
    }
}
