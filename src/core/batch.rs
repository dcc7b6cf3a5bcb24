//! Template batch: fill every configured template and save it to the outputs folder.
//!
//! Templates are independent. Each is opened, edited and saved on its own;
//! a failure aborts that template only and is collected in the [`RunSummary`].

use crate::core::catalog::TableCatalog;
use crate::core::resizer::replace_table_data;
use crate::core::sheet_replacer;
use crate::error::ReportResult;
use crate::excel::importer::InputLoader;
use crate::excel::range::CellRange;
use crate::excel::workbook::XlsxDocument;
use crate::types::{Settings, TemplateOutputs};
use std::path::PathBuf;
use tracing::{error, info};

/// Folders and switches for one run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_folder: PathBuf,
    pub templates_folder: PathBuf,
    pub outputs_folder: PathBuf,
    /// Process everything but write nothing
    pub dry_run: bool,
}

/// What happened to one template
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateReport {
    pub template: String,
    /// Final range of every updated table, in update order
    pub tables: Vec<(String, CellRange)>,
    pub sheets: Vec<String>,
    /// `None` on a dry run
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub succeeded: Vec<TemplateReport>,
    /// (template, error message)
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Process every template in `settings`, in name order.
pub fn run(settings: &Settings, options: &RunOptions) -> RunSummary {
    let mut loader = InputLoader::new(&options.input_folder);
    let mut summary = RunSummary::default();

    for (template, outputs) in &settings.templates {
        match process_template(template, outputs, &mut loader, options) {
            Ok(report) => summary.succeeded.push(report),
            Err(e) => {
                error!("Template '{}' failed: {}", template, e);
                summary.failed.push((template.clone(), e.to_string()));
            }
        }
    }

    info!(
        "Processed {} template(s): {} succeeded, {} failed",
        settings.templates.len(),
        summary.succeeded.len(),
        summary.failed.len()
    );
    summary
}

/// Fill one template: tables top to bottom, then sheets, then save once.
pub fn process_template(
    template: &str,
    outputs: &TemplateOutputs,
    loader: &mut InputLoader,
    options: &RunOptions,
) -> ReportResult<TemplateReport> {
    info!("Adding data to template '{}'", template);
    let mut doc = XlsxDocument::open(options.templates_folder.join(template))?;
    let mut catalog = TableCatalog::load(&doc, template)?;

    // Tables lower on a sheet move when the ones above resize, so go top-down.
    let mut table_names: Vec<&String> = outputs.tables.keys().collect();
    table_names.sort_by_key(|name| catalog.position(name).unwrap_or(usize::MAX));

    let mut report = TemplateReport {
        template: template.to_string(),
        tables: Vec::new(),
        sheets: Vec::new(),
        output: None,
    };

    for name in table_names {
        let data = loader.load(&outputs.tables[name])?;
        let range = replace_table_data(&mut doc, &mut catalog, name, &data)?;
        report.tables.push((name.clone(), range));
    }

    for (sheet, source) in &outputs.sheets {
        let data = loader.load(source)?;
        sheet_replacer::replace(&mut doc, sheet, &data)?;
        report.sheets.push(sheet.clone());
    }

    if options.dry_run {
        info!("Dry run: not saving '{}'", template);
    } else {
        let output = options.outputs_folder.join(template);
        doc.save(&output)?;
        info!("Saved '{}'", output.display());
        report.output = Some(output);
    }
    Ok(report)
}
