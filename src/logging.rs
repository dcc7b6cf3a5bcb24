//! tracing subscriber setup for the binary

use crate::error::ReportResult;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file name for a run started at `now`
pub fn log_file_name(now: chrono::NaiveDateTime) -> String {
    format!("{}.log", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the default level. With `log_dir`, events are also
/// written (without colors) to a timestamped file there, whose path is
/// returned. Installing twice is a no-op.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> ReportResult<Option<PathBuf>> {
    let default_level = if verbose {
        "xlsx_reporting=debug"
    } else {
        "xlsx_reporting=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name(chrono::Local::now().naive_local()));
            let file = File::create(&path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    Ok(log_path)
}
