use std::path::PathBuf;

/// Number of rows echoed back after loading, matching a dataframe `head()`.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Run settings for a single screen invocation.
///
/// Only I/O concerns live here. Indicator spans, rolling windows and filter
/// thresholds are fixed constants in `indicators` and `filter`.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_csv: PathBuf,
    /// Explicit chrono format for the date column (e.g. `%d-%b-%y`). When
    /// omitted the loader tries the formats in `data::DATE_FORMATS`.
    pub date_format: Option<String>,
    /// Rows printed from the freshly loaded table before screening.
    pub preview_rows: usize,
    /// Suppress the console tables; only the final verdict line is printed.
    pub quiet: bool,
}

impl Config {
    pub fn new(input_csv: impl Into<PathBuf>) -> Self {
        Self {
            input_csv: input_csv.into(),
            date_format: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            quiet: false,
        }
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }
}
