use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use xlsx_reporting::cli;
use xlsx_reporting::core::RunOptions;
use xlsx_reporting::logging;

#[derive(Parser)]
#[command(name = "xlsx-reporting")]
#[command(about = "Fill Excel report templates with data from CSV and Excel inputs")]
#[command(long_about = "xlsx-reporting - Fill Excel report templates from a YAML config

Every structured table named in the config is resized to exactly fit its
input data; tables further down the same sheet move with it. Plain sheets
are rewritten below their header row.

COMMANDS:
  run      - Fill every configured template and save to the outputs folder
  inspect  - List the structured tables of a workbook

EXAMPLES:
  xlsx-reporting run                                  # default folders
  xlsx-reporting run -c settings.yaml -d 2024-12-31 -n
  xlsx-reporting inspect outputs/report.xlsx")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill every configured template and save to the outputs folder
    Run {
        /// Folder holding the input files named in the config
        #[arg(short, long, default_value = "inputs/input_files")]
        input_files_folder: PathBuf,

        /// Folder holding the .xlsx templates
        #[arg(short = 'x', long, default_value = "inputs/xlsx_templates")]
        xlsx_templates_folder: PathBuf,

        /// Folder the filled templates are written to
        #[arg(short, long, default_value = "outputs")]
        outputs_folder: PathBuf,

        /// Report date (YYYY-MM-DD, default today)
        #[arg(short = 'd', long)]
        report_date: Option<String>,

        /// YAML settings file
        #[arg(short, long, default_value = "inputs/settings.yaml")]
        config_path: PathBuf,

        /// Also write a timestamped log file to this folder
        #[arg(long, env = "XLSX_REPORTING_LOG_DIR")]
        log_dir: Option<PathBuf>,

        /// Process every template without writing outputs
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Debug-level logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the structured tables of a workbook
    Inspect {
        /// Path to an .xlsx file
        workbook: PathBuf,

        /// Debug-level logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input_files_folder,
            xlsx_templates_folder,
            outputs_folder,
            report_date,
            config_path,
            log_dir,
            dry_run,
            verbose,
        } => {
            logging::init_logging(verbose, log_dir.as_deref())?;
            let options = RunOptions {
                input_folder: input_files_folder,
                templates_folder: xlsx_templates_folder,
                outputs_folder,
                dry_run,
            };
            let summary = cli::run(&config_path, report_date.as_deref(), options)?;
            if summary.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Inspect { workbook, verbose } => {
            logging::init_logging(verbose, None)?;
            cli::inspect(&workbook)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
