use std::path::Path;

use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{Result, ScreenError};

pub const DATE_COLUMN: &str = "date";

/// Date layouts tried in order when no explicit format is configured. The
/// first entry is the `01-Jan-24` style exported by common quote downloads.
pub const DATE_FORMATS: &[&str] = &["%d-%b-%y", "%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y"];

/// Cell spellings read as missing values, on top of empty fields.
pub const NULL_MARKERS: &[&str] = &["null", "NULL", "NaN", "nan", "NA", "N/A", "#N/A"];

/// A daily time series keyed by strictly ascending calendar dates.
///
/// The frame keeps every input column (names normalised to snake_case) and
/// the `date` column is rewritten as ISO `YYYY-MM-DD` strings. The parsed
/// keys are held alongside so rolling and lag computations never need to
/// re-read them.
#[derive(Clone, Debug)]
pub struct PriceTable {
    frame: DataFrame,
    dates: Vec<NaiveDate>,
}

impl PriceTable {
    pub fn load(path: &Path, date_format: Option<&str>) -> Result<Self> {
        let frame = CsvReader::from_path(path)?
            .infer_schema(Some(1024))
            .has_header(true)
            .with_null_values(Some(NullValues::AllColumns(
                NULL_MARKERS.iter().map(|marker| marker.to_string()).collect(),
            )))
            .finish()?;
        let table = Self::from_frame(frame, date_format)?;
        info!(
            path = %path.display(),
            rows = table.height(),
            columns = ?table.column_names(),
            "Loaded price table"
        );
        Ok(table)
    }

    /// Build a table from an in-memory frame: normalise the column names,
    /// parse the `date` column and check the ordering invariant.
    pub fn from_frame(frame: DataFrame, date_format: Option<&str>) -> Result<Self> {
        let mut frame = frame;
        normalize_column_names(&mut frame)?;

        let raw_dates = frame
            .column(DATE_COLUMN)
            .map_err(|_| ScreenError::missing_column(DATE_COLUMN))?
            .cast(&DataType::String)?;
        let mut dates = Vec::with_capacity(raw_dates.len());
        for (row, value) in raw_dates.str()?.into_iter().enumerate() {
            let raw = value.ok_or_else(|| ScreenError::NullValue {
                column: DATE_COLUMN.to_string(),
                row,
            })?;
            let date = parse_date(raw, date_format).ok_or_else(|| ScreenError::InvalidDate {
                row,
                value: raw.to_string(),
            })?;
            if let Some(&previous) = dates.last() {
                if date <= previous {
                    return Err(ScreenError::UnorderedDates {
                        row,
                        previous,
                        current: date,
                    });
                }
            }
            dates.push(date);
        }

        let iso: Vec<String> = dates
            .iter()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .collect();
        frame.with_column(Series::new(DATE_COLUMN, iso))?;

        Ok(Self { frame, dates })
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn data_frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(ScreenError::missing_column(*missing)),
            None => Ok(()),
        }
    }

    /// Read a numeric column as `f64`. Integer columns are widened; nulls,
    /// NaN and unparseable text cells all come back as `None`.
    pub fn optional_float_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self
            .frame
            .column(name)
            .map_err(|_| ScreenError::missing_column(name))?
            .cast(&DataType::Float64)?;
        let values = series
            .f64()?
            .into_iter()
            .map(|value| value.filter(|v| !v.is_nan()))
            .collect();
        Ok(values)
    }

    /// Return a copy of the table with the given float columns appended (or
    /// replaced when a column of the same name already exists).
    pub fn with_float_columns(&self, columns: Vec<(&str, Vec<Option<f64>>)>) -> Result<Self> {
        let mut frame = self.frame.clone();
        for (name, values) in columns {
            frame.with_column(Series::new(name, values))?;
        }
        Ok(Self {
            frame,
            dates: self.dates.clone(),
        })
    }

    /// Keep the rows whose mask entry is true, preserving their order.
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        let keep = BooleanChunked::from_slice("mask", mask);
        let frame = self.frame.filter(&keep)?;
        let dates = self
            .dates
            .iter()
            .zip(mask)
            .filter_map(|(date, keep)| keep.then_some(*date))
            .collect();
        Ok(Self { frame, dates })
    }

    pub fn head(&self, rows: usize) -> DataFrame {
        self.frame.head(Some(rows))
    }
}

/// Lowercase and snake_case every column name (`Adj Close` -> `adj_close`).
/// A rename that would collide with an existing column is skipped.
fn normalize_column_names(frame: &mut DataFrame) -> Result<()> {
    let names: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    for name in names {
        let normalized = normalize_column_name(&name);
        if normalized == name {
            continue;
        }
        if frame.column(&normalized).is_ok() {
            debug!(column = %name, target = %normalized, "Skipping colliding column rename");
            continue;
        }
        frame.rename(&name, &normalized)?;
    }
    Ok(())
}

pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Parse a date cell with the configured format, or with `DATE_FORMATS`
/// followed by RFC 3339 timestamps when none is configured.
pub fn parse_date(raw: &str, format: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(format) = format {
        return NaiveDate::parse_from_str(raw, format).ok();
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|parsed| parsed.date_naive())
        })
}
