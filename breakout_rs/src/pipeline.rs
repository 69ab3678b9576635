use tracing::info;

use crate::config::Config;
use crate::data::PriceTable;
use crate::error::Result;
use crate::filter::apply_filters;
use crate::fingerprint::{sha256_file, sha256_frame_as_csv};
use crate::indicators::compute_indicators;

/// Result of screening one table.
#[derive(Clone, Debug)]
pub struct ScreenOutcome {
    /// The loaded table before any derived column was added.
    pub raw: PriceTable,
    /// Raw columns plus the six derived indicator columns.
    pub augmented: PriceTable,
    /// Rows of `augmented` that pass every filter clause.
    pub matches: PriceTable,
}

impl ScreenOutcome {
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// Run the indicator engine and the filter over an in-memory table.
pub fn screen_table(raw: PriceTable) -> Result<ScreenOutcome> {
    let augmented = compute_indicators(&raw)?;
    let matches = apply_filters(&augmented)?;

    let result_sha256 = sha256_frame_as_csv(matches.data_frame())?;
    info!(
        rows = augmented.height(),
        matches = matches.height(),
        sha256 = %result_sha256,
        "Screen complete"
    );
    Ok(ScreenOutcome {
        raw,
        augmented,
        matches,
    })
}

/// Fingerprint and load `config.input_csv` without screening it.
pub fn load_input(config: &Config) -> Result<PriceTable> {
    let input_sha256 = sha256_file(&config.input_csv)?;
    info!(
        path = %config.input_csv.display(),
        sha256 = %input_sha256,
        "Screening input dataset"
    );
    PriceTable::load(&config.input_csv, config.date_format.as_deref())
}

/// Load `config.input_csv` and screen it.
pub fn screen_csv(config: &Config) -> Result<ScreenOutcome> {
    screen_table(load_input(config)?)
}
