use std::path::PathBuf;

use anyhow::{Result, anyhow};
use breakout_rs::Config;
use breakout_rs::config::DEFAULT_PREVIEW_ROWS;
use chrono::format::{Item, StrftimeItems};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "breakout",
    version,
    about = "Flag daily bars that break out to a new 222-day high on rising trend and volume"
)]
pub struct Cli {
    /// The path to the CSV file containing stock data
    #[arg(value_name = "CSV_FILE", value_hint = clap::ValueHint::FilePath)]
    pub csv_file: PathBuf,

    /// chrono format of the Date column (e.g. %d-%b-%y). When omitted,
    /// common layouts are tried in turn.
    #[arg(long = "date-format")]
    pub date_format: Option<String>,

    /// Number of loaded rows to echo before screening
    #[arg(long = "preview-rows", default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub preview_rows: usize,

    /// Also append logs to this file
    #[arg(long = "log-file", value_hint = clap::ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Only print the final verdict line
    #[arg(long = "quiet", default_value_t = false)]
    pub quiet: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<Config> {
        if let Some(format) = self.date_format.as_deref() {
            validate_date_format(format)?;
        }
        Ok(Config {
            input_csv: self.csv_file,
            date_format: self.date_format,
            preview_rows: self.preview_rows,
            quiet: self.quiet,
        })
    }
}

fn validate_date_format(format: &str) -> Result<()> {
    if format.trim().is_empty() {
        return Err(anyhow!("--date-format must not be empty"));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(anyhow!("Invalid --date-format '{format}'"));
    }
    Ok(())
}
