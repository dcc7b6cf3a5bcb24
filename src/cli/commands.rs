use crate::core::batch::{self, RunOptions, RunSummary};
use crate::core::TableCatalog;
use crate::error::{ReportError, ReportResult};
use crate::excel::XlsxDocument;
use crate::parser;
use chrono::NaiveDate;
use colored::Colorize;
use std::path::Path;
use tracing::info;

/// Parse `YYYY-MM-DD`, defaulting to today
fn parse_report_date(raw: Option<&str>) -> ReportResult<NaiveDate> {
    match raw {
        None => Ok(chrono::Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ReportError::InvalidDate(s.to_string())),
    }
}

fn require_dir(kind: &'static str, path: &Path) -> ReportResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ReportError::MissingPath {
            kind,
            path: path.display().to_string(),
        })
    }
}

fn require_file(kind: &'static str, path: &Path) -> ReportResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ReportError::MissingPath {
            kind,
            path: path.display().to_string(),
        })
    }
}

/// Execute the run command
pub fn run(
    config_path: &Path,
    report_date: Option<&str>,
    options: RunOptions,
) -> ReportResult<RunSummary> {
    println!("{}", "📊 xlsx-reporting - Filling report templates".bold().green());

    require_dir("input files folder", &options.input_folder)?;
    require_dir("templates folder", &options.templates_folder)?;
    require_dir("outputs folder", &options.outputs_folder)?;
    require_file("config file", config_path)?;
    let report_date = parse_report_date(report_date)?;

    println!("   Input files: {}", options.input_folder.display());
    println!("   Templates:   {}", options.templates_folder.display());
    println!("   Outputs:     {}", options.outputs_folder.display());
    println!("   Config:      {}", config_path.display());
    println!("   Report date: {}", report_date.to_string().bright_yellow());
    println!();
    info!("Report date {}", report_date);

    if options.dry_run {
        println!(
            "{}",
            "📋 DRY RUN MODE - No output files will be written\n".yellow()
        );
    }

    let settings = parser::load_settings(config_path)?;
    let summary = batch::run(&settings, &options);

    for report in &summary.succeeded {
        println!("{} {}", "✅".green(), report.template.bright_blue().bold());
        for (table, range) in &report.tables {
            println!(
                "      table {} → {} ({} rows)",
                table.cyan(),
                range,
                range.data_rows()
            );
        }
        for sheet in &report.sheets {
            println!("      sheet {}", sheet.cyan());
        }
        if let Some(output) = &report.output {
            println!("      saved {}", output.display());
        }
    }
    for (template, message) in &summary.failed {
        println!("{} {}: {}", "❌".red(), template.bright_blue().bold(), message.red());
    }

    println!();
    if summary.is_success() {
        println!(
            "{}",
            format!("✅ {} template(s) filled", summary.succeeded.len())
                .bold()
                .green()
        );
    } else {
        println!(
            "{}",
            format!(
                "❌ {} of {} template(s) failed",
                summary.failed.len(),
                summary.failed.len() + summary.succeeded.len()
            )
            .bold()
            .red()
        );
    }

    Ok(summary)
}

/// Execute the inspect command
pub fn inspect(workbook: &Path) -> ReportResult<TableCatalog> {
    println!("{}", "🔍 xlsx-reporting - Table inventory".bold().green());
    println!("   File: {}\n", workbook.display());

    let doc = XlsxDocument::open(workbook)?;
    let file = workbook
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| workbook.display().to_string());
    let catalog = TableCatalog::load(&doc, &file)?;

    if catalog.is_empty() {
        println!("{}", "   No tables found".yellow());
    }
    let mut current_sheet = None;
    for table in catalog.iter() {
        if current_sheet != Some(&table.sheet) {
            println!("   📄 Sheet: {}", table.sheet.bright_blue().bold());
            current_sheet = Some(&table.sheet);
        }
        println!(
            "      {} {} ({} rows)",
            table.name.cyan(),
            table.range,
            table.data_rows()
        );
    }

    Ok(catalog)
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
