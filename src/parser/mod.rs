use crate::error::{ReportError, ReportResult};
use crate::types::{DataSource, RawSettings, Settings, SourceKind, TemplateOutputs};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info};

const XL_TABLE: &str = "xl_table";
const XL_SHEET: &str = "xl_sheet";

/// Load and validate a settings file.
///
/// The file is first read into a generic YAML value, which rejects duplicate
/// mapping keys at any depth, and only then converted into [`RawSettings`].
/// Every data source is checked and turned into a [`DataSource`] here, so the
/// processing core never sees the dictionary-shaped YAML.
///
/// # Example
/// ```no_run
/// use xlsx_reporting::parser::load_settings;
/// use std::path::Path;
///
/// let settings = load_settings(Path::new("inputs/settings.yaml"))?;
/// println!("Templates: {}", settings.templates.len());
/// # Ok::<(), xlsx_reporting::error::ReportError>(())
/// ```
pub fn load_settings(path: &Path) -> ReportResult<Settings> {
    info!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| {
        error!("Failed to read configuration {}: {}", path.display(), e);
        e
    })?;
    parse_settings(&content)
}

/// Parse settings from YAML text
pub fn parse_settings(content: &str) -> ReportResult<Settings> {
    let yaml: Value = serde_yaml::from_str(content).map_err(|e| {
        error!("YAML error in configuration: {}", e);
        e
    })?;
    let raw: RawSettings = serde_yaml::from_value(yaml).map_err(|e| {
        error!("Configuration has an unexpected shape: {}", e);
        e
    })?;

    let mut settings = Settings::default();
    for (template, outputs) in raw.output_from_input_dict {
        let mut parsed = TemplateOutputs::default();
        for (table, entry) in &outputs.tables {
            let source = parse_source(entry)
                .map_err(|e| log_source_error(&template, "table", table, e))?;
            debug!("{} table '{}' <- {}", template, table, source);
            parsed.tables.insert(table.clone(), source);
        }
        for (sheet, entry) in &outputs.sheets {
            let source = parse_source(entry)
                .map_err(|e| log_source_error(&template, "sheet", sheet, e))?;
            debug!("{} sheet '{}' <- {}", template, sheet, source);
            parsed.sheets.insert(sheet.clone(), source);
        }
        settings.templates.insert(template, parsed);
    }

    info!("Configuration loaded: {} template(s)", settings.templates.len());
    Ok(settings)
}

fn log_source_error(template: &str, kind: &str, name: &str, e: ReportError) -> ReportError {
    error!("Invalid data source for {} '{}' in {}: {}", kind, name, template, e);
    e
}

/// Turn `{<file>: {...}}` into a [`DataSource`]
pub fn parse_source(entry: &Mapping) -> ReportResult<DataSource> {
    if entry.len() != 1 {
        let keys: Vec<String> = entry.keys().map(key_to_string).collect();
        return Err(ReportError::InvalidConfig(format!(
            "expected a single input file per data source, found {:?}",
            keys
        )));
    }
    let (file_key, body) = entry
        .iter()
        .next()
        .ok_or_else(|| ReportError::InvalidConfig("empty data source".to_string()))?;
    let file = file_key
        .as_str()
        .ok_or_else(|| ReportError::InvalidConfig("input file name must be a string".to_string()))?
        .to_string();

    let extension = Path::new(&file)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let empty = Mapping::new();
    let body = match body {
        Value::Mapping(m) => m,
        Value::Null => &empty,
        _ => {
            return Err(ReportError::InvalidConfig(format!(
                "settings for '{}' must be a mapping",
                file
            )))
        }
    };

    match extension.as_str() {
        "csv" => Ok(DataSource {
            kind: SourceKind::Csv,
            column_mapping: string_pairs(body, "column_mapping")?,
            column_types: string_map(body, "column_types")?,
            file,
        }),
        "xlsx" | "xlsm" => {
            if body.len() != 1 {
                return Err(ReportError::InvalidConfig(format!(
                    "'{}' must declare exactly one of {} or {}",
                    file, XL_TABLE, XL_SHEET
                )));
            }
            let (xl_type, xl_settings) = body
                .iter()
                .next()
                .ok_or_else(|| ReportError::InvalidConfig(format!("'{}' is empty", file)))?;
            let xl_type = key_to_string(xl_type);
            let xl_settings = xl_settings.as_mapping().ok_or_else(|| {
                ReportError::InvalidConfig(format!("'{}.{}' must be a mapping", file, xl_type))
            })?;

            let name = xl_settings
                .get("name")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    ReportError::InvalidConfig(format!("missing name for {} in '{}'", xl_type, file))
                })?
                .to_string();

            let kind = match xl_type.as_str() {
                XL_TABLE => SourceKind::ExcelTable { name },
                XL_SHEET => SourceKind::ExcelSheet { name },
                other => return Err(ReportError::UnsupportedSourceType(other.to_string())),
            };

            Ok(DataSource {
                kind,
                column_mapping: string_pairs(xl_settings, "column_mapping")?,
                column_types: string_map(xl_settings, "column_types")?,
                file,
            })
        }
        other => Err(ReportError::UnsupportedSourceType(format!(
            "file extension '.{}' ({})",
            other, file
        ))),
    }
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Ordered `old: new` pairs
fn string_pairs(map: &Mapping, field: &str) -> ReportResult<Vec<(String, String)>> {
    let Some(value) = map.get(field) else {
        return Ok(Vec::new());
    };
    let Value::Mapping(inner) = value else {
        if value.is_null() {
            return Ok(Vec::new());
        }
        return Err(ReportError::InvalidConfig(format!("'{}' must be a mapping", field)));
    };
    inner
        .iter()
        .map(|(k, v)| {
            let v = scalar_to_string(v).ok_or_else(|| {
                ReportError::InvalidConfig(format!(
                    "'{}.{}' must be a plain value",
                    field,
                    key_to_string(k)
                ))
            })?;
            Ok((key_to_string(k), v))
        })
        .collect()
}

fn string_map(map: &Mapping, field: &str) -> ReportResult<BTreeMap<String, String>> {
    Ok(string_pairs(map, field)?.into_iter().collect())
}
