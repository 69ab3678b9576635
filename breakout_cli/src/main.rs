mod cli;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use breakout_rs::{Config, PriceTable, ScreenOutcome, load_input, screen_table};
use clap::Parser;
use cli::Cli;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Install the global subscriber: stderr always, plus a plain-text copy in
/// `log_file` when one is given. The returned guard flushes the file writer
/// when dropped, so `main` holds it until exit.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout is reserved for the report.
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = non_blocking(open_log_file(path)?);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
    Ok(guard)
}

fn log_invocation(log_file: Option<&PathBuf>) {
    let cwd = std::env::current_dir().ok();
    let argv: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        cwd = ?cwd,
        log_file = ?log_file,
        argv = ?argv,
        "breakout_cli invoked"
    );
}

fn print_preview(config: &Config, raw: &PriceTable) {
    if config.quiet {
        return;
    }
    println!("Data read from CSV file:");
    println!("{}", raw.head(config.preview_rows));
}

fn print_report(config: &Config, outcome: &ScreenOutcome) {
    if !config.quiet {
        println!("Filtered DataFrame:");
        println!("{}", outcome.matches.data_frame());
    }
    let verdict = if outcome.has_matches() {
        config.input_csv.display().to_string()
    } else {
        "None".to_string()
    };
    println!("Stocks that pass all filters: {verdict}");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_file = cli.log_file.clone();

    let _log_guard = init_tracing(log_file.as_deref())?;
    log_invocation(log_file.as_ref());

    let config = cli.into_config()?;
    let context = || format!("Failed to screen {}", config.input_csv.display());

    // The loaded rows are shown before screening so a failure still has context.
    let raw = load_input(&config).with_context(context)?;
    print_preview(&config, &raw);
    let outcome = screen_table(raw).with_context(context)?;
    print_report(&config, &outcome);
    Ok(())
}
