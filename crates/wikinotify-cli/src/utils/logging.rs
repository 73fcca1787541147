//! Logging initialization and configuration.
//!
//! Log lines go to stdout and, when the file can be opened, to the log file
//! as well. The file never receives ANSI color codes.

use anyhow::Result;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry, fmt};

use crate::cli::Cli;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logging subsystem based on CLI flags.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else if cli.quiet {
        LevelFilter::ERROR
    } else {
        LevelFilter::INFO
    };

    let mut layers: Vec<BoxedLayer> = vec![console_layer(cli.log_json)];
    let file_error = match open_log_file(&cli.log_file) {
        Ok(file) => {
            layers.push(file_layer(file, cli.log_json));
            None
        },
        Err(e) => Some(e),
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(level)
        .try_init()?;

    if let Some(e) = file_error {
        warn!(path = %cli.log_file.display(), error = %e, "Could not open log file, logging to stdout only");
    }
    Ok(())
}

fn console_layer(json: bool) -> BoxedLayer {
    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(io::stdout);
    if json { layer.json().boxed() } else { layer.boxed() }
}

fn file_layer(file: File, json: bool) -> BoxedLayer {
    let layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    if json { layer.json().boxed() } else { layer.boxed() }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
