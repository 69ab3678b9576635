//! Indicator engine: derives the rolling and exponential columns that the
//! breakout filter reads.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::data::PriceTable;
use crate::error::Result;

pub const CLOSE: &str = "close";
pub const VOLUME: &str = "volume";
pub const HIGH: &str = "high";

/// Raw columns the engine reads, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 3] = [CLOSE, VOLUME, HIGH];

pub const SMA20_VOLUME: &str = "sma20_volume";
pub const EMA9: &str = "ema9";
pub const EMA13: &str = "ema13";
pub const EMA50: &str = "ema50";
pub const EMA200: &str = "ema200";
pub const MAX_HIGH_222: &str = "max_high_222";

pub const VOLUME_SMA_WINDOW: usize = 20;
pub const MAX_HIGH_WINDOW: usize = 222;

/// EMA spans paired with the column each one fills.
pub const EMA_SPANS: [(&str, usize); 4] = [(EMA9, 9), (EMA13, 13), (EMA50, 50), (EMA200, 200)];

/// Names of every derived column, in the order they are appended.
pub const DERIVED_COLUMNS: [&str; 6] = [SMA20_VOLUME, EMA9, EMA13, EMA50, EMA200, MAX_HIGH_222];

/// Append the six derived columns to `table`.
///
/// Fails with `MissingColumn` before computing anything when `close`,
/// `volume` or `high` is absent. Rows without a full lookback window get a
/// null, never a number, and so does any window holding a missing raw value.
pub fn compute_indicators(table: &PriceTable) -> Result<PriceTable> {
    table.require_columns(&REQUIRED_COLUMNS)?;

    let close = table.optional_float_column(CLOSE)?;
    let volume = table.optional_float_column(VOLUME)?;
    let high = table.optional_float_column(HIGH)?;

    for (name, values) in [(CLOSE, &close), (VOLUME, &volume), (HIGH, &high)] {
        let missing = values.iter().filter(|value| value.is_none()).count();
        if missing > 0 {
            warn!(column = name, missing, "Raw column has missing values");
        }
    }

    let mut columns: Vec<(&str, Vec<Option<f64>>)> = Vec::with_capacity(DERIVED_COLUMNS.len());
    columns.push((SMA20_VOLUME, sma(&volume, VOLUME_SMA_WINDOW)));
    for (name, span) in EMA_SPANS {
        columns.push((name, ema(&close, span)));
    }
    columns.push((MAX_HIGH_222, rolling_max(&high, MAX_HIGH_WINDOW)));

    for (name, values) in &columns {
        debug!(
            column = *name,
            defined = values.iter().filter(|value| value.is_some()).count(),
            rows = values.len(),
            "Derived indicator column"
        );
    }

    table.with_float_columns(columns)
}

/// Smoothing factor for an EMA of the given span.
pub fn ema_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Exponential moving average seeded with the first present value:
/// `ema[0] = x[0]`, `ema[t] = a * x[t] + (1 - a) * ema[t - 1]`.
///
/// Rows before the first present value stay undefined. A missing value
/// repeats the previous average, and the weight of that average keeps
/// decaying by `1 - a` per missing row, so the next present value counts
/// for more once the gap closes.
pub fn ema(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let alpha = ema_alpha(span);
    let mut result = Vec::with_capacity(values.len());
    let mut average: Option<f64> = None;
    let mut carried_weight = 1.0_f64;
    for &value in values {
        match (average, value) {
            (None, Some(value)) => {
                average = Some(value);
                carried_weight = 1.0;
            }
            (Some(prev), Some(value)) => {
                carried_weight *= 1.0 - alpha;
                // Equal inputs keep a constant series exactly constant.
                if prev != value {
                    average = Some(
                        (carried_weight * prev + alpha * value) / (carried_weight + alpha),
                    );
                }
                carried_weight = 1.0;
            }
            (Some(_), None) => carried_weight *= 1.0 - alpha,
            (None, None) => {}
        }
        result.push(average);
    }
    result
}

/// Trailing simple mean over `period` rows (current row inclusive), kept as
/// a running sum. A window holding a missing value is undefined.
pub fn sma(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 {
        return result;
    }
    let mut sum = 0.0_f64;
    let mut missing = 0_usize;
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(value) => sum += value,
            None => missing += 1,
        }
        if i >= period {
            match values[i - period] {
                Some(old) => sum -= old,
                None => missing -= 1,
            }
        }
        if i + 1 >= period && missing == 0 {
            result[i] = Some(sum / period as f64);
        }
    }
    result
}

/// Trailing maximum over `period` rows (current row inclusive). A window
/// holding a missing value is undefined.
///
/// The deque holds `(index, value)` pairs whose values are strictly
/// decreasing from front to back, so the front is always the window maximum.
pub fn rolling_max(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 {
        return result;
    }
    let mut window: VecDeque<(usize, f64)> = VecDeque::with_capacity(period);
    let mut last_missing: Option<usize> = None;
    for (i, value) in values.iter().enumerate() {
        match *value {
            Some(value) => {
                while window.back().is_some_and(|&(_, kept)| kept <= value) {
                    window.pop_back();
                }
                window.push_back((i, value));
            }
            None => last_missing = Some(i),
        }
        if window.front().is_some_and(|&(j, _)| j + period <= i) {
            window.pop_front();
        }
        let gap_in_window = last_missing.is_some_and(|j| j + period > i);
        if i + 1 >= period && !gap_in_window {
            result[i] = window.front().map(|&(_, max)| max);
        }
    }
    result
}
