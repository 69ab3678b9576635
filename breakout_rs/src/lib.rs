pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod indicators;
pub mod mask;
pub mod pipeline;

pub use config::Config;
pub use data::PriceTable;
pub use error::{Result, ScreenError};
pub use filter::{BreakoutInputs, Clause, apply_filters, breakout_mask};
pub use indicators::compute_indicators;
pub use pipeline::{ScreenOutcome, load_input, screen_csv, screen_table};
