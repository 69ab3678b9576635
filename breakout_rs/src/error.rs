//! Error types surfaced by the screening library.

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScreenError>;

#[derive(Debug, Error)]
pub enum ScreenError {
    /// A column the computation depends on is absent from the table.
    #[error("Column '{0}' not found in data")]
    MissingColumn(String),

    /// A row key is null; numeric gaps are not errors.
    #[error("Column '{column}' contains a null value at row {row}")]
    NullValue { column: String, row: usize },

    #[error("Unable to parse date '{value}' at row {row}")]
    InvalidDate { row: usize, value: String },

    /// Row keys must be strictly increasing; duplicates are rejected too.
    #[error("Dates must be strictly ascending: row {row} has {current} after {previous}")]
    UnorderedDates {
        row: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenError {
    pub fn missing_column(name: impl Into<String>) -> Self {
        ScreenError::MissingColumn(name.into())
    }

    /// Name of the absent column when this is a `MissingColumn` error.
    pub fn missing_column_name(&self) -> Option<&str> {
        match self {
            ScreenError::MissingColumn(name) => Some(name.as_str()),
            _ => None,
        }
    }
}
