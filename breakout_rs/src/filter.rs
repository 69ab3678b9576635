//! The breakout predicate: a fixed conjunction of eight price, volume and
//! trend clauses evaluated per row.

use std::fmt;

use tracing::{debug, info};

use crate::data::PriceTable;
use crate::error::Result;
use crate::indicators::{
    CLOSE, EMA9, EMA13, EMA50, EMA200, HIGH, MAX_HIGH_222, SMA20_VOLUME, VOLUME,
};
use crate::mask::{self, Mask};

pub const MIN_CLOSE: f64 = 50.0;
pub const MIN_DAILY_GAIN: f64 = 1.01;
pub const VOLUME_SURGE: f64 = 1.1;
pub const MAX_PRIOR_DROP: f64 = 0.98;

/// Value substituted for an undefined `max_high_222` in the new-high clause.
pub const MAX_HIGH_SENTINEL: f64 = 0.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Clause {
    /// `close >= 50`
    PriceFloor,
    /// `close >= prev_close * 1.01`
    DailyGain,
    /// `volume > sma20_volume * 1.1`
    VolumeSurge,
    /// `high == max_high_222`, undefined treated as 0
    NewHigh,
    /// `prev_close > close two rows back * 0.98`
    NoPriorDrop,
    /// `ema13 > ema50`
    MediumTrend,
    /// `ema50 > ema200`
    LongTrend,
    /// `close > ema9`
    AboveShortTrend,
}

impl Clause {
    pub const ALL: [Clause; 8] = [
        Clause::PriceFloor,
        Clause::DailyGain,
        Clause::VolumeSurge,
        Clause::NewHigh,
        Clause::NoPriorDrop,
        Clause::MediumTrend,
        Clause::LongTrend,
        Clause::AboveShortTrend,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Clause::PriceFloor => "price_floor",
            Clause::DailyGain => "daily_gain",
            Clause::VolumeSurge => "volume_surge",
            Clause::NewHigh => "new_high",
            Clause::NoPriorDrop => "no_prior_drop",
            Clause::MediumTrend => "ema13_above_ema50",
            Clause::LongTrend => "ema50_above_ema200",
            Clause::AboveShortTrend => "close_above_ema9",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column values the predicate reads, pulled out of an augmented table once.
///
/// Every column comes from the same frame, so all vectors share one length;
/// the fields stay private to keep it that way.
#[derive(Clone, Debug)]
pub struct BreakoutInputs {
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    sma20_volume: Vec<Option<f64>>,
    ema9: Vec<Option<f64>>,
    ema13: Vec<Option<f64>>,
    ema50: Vec<Option<f64>>,
    ema200: Vec<Option<f64>>,
    max_high_222: Vec<Option<f64>>,
}

impl BreakoutInputs {
    pub fn from_table(table: &PriceTable) -> Result<Self> {
        table.require_columns(&[
            CLOSE,
            VOLUME,
            HIGH,
            SMA20_VOLUME,
            EMA9,
            EMA13,
            EMA50,
            EMA200,
            MAX_HIGH_222,
        ])?;
        Ok(Self {
            close: table.optional_float_column(CLOSE)?,
            volume: table.optional_float_column(VOLUME)?,
            high: table.optional_float_column(HIGH)?,
            sma20_volume: table.optional_float_column(SMA20_VOLUME)?,
            ema9: table.optional_float_column(EMA9)?,
            ema13: table.optional_float_column(EMA13)?,
            ema50: table.optional_float_column(EMA50)?,
            ema200: table.optional_float_column(EMA200)?,
            max_high_222: table.optional_float_column(MAX_HIGH_222)?,
        })
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Whether `clause` holds at row `t`. Missing lags, missing raw values
    /// and undefined derived values make the clause fail.
    pub fn clause_holds(&self, clause: Clause, t: usize) -> bool {
        let close = self.close[t];
        match clause {
            Clause::PriceFloor => close.is_some_and(|c| c >= MIN_CLOSE),
            Clause::DailyGain => match (close, self.lagged_close(t, 1)) {
                (Some(c), Some(prev)) => c >= prev * MIN_DAILY_GAIN,
                _ => false,
            },
            Clause::VolumeSurge => match (self.volume[t], self.sma20_volume[t]) {
                (Some(volume), Some(avg)) => volume > avg * VOLUME_SURGE,
                _ => false,
            },
            Clause::NewHigh => {
                let max_high = self.max_high_222[t].unwrap_or(MAX_HIGH_SENTINEL);
                self.high[t].is_some_and(|high| high == max_high)
            }
            Clause::NoPriorDrop => match (self.lagged_close(t, 1), self.lagged_close(t, 2)) {
                (Some(prev), Some(prev2)) => prev > prev2 * MAX_PRIOR_DROP,
                _ => false,
            },
            Clause::MediumTrend => greater(self.ema13[t], self.ema50[t]),
            Clause::LongTrend => greater(self.ema50[t], self.ema200[t]),
            Clause::AboveShortTrend => greater(close, self.ema9[t]),
        }
    }

    fn lagged_close(&self, t: usize, lag: usize) -> Option<f64> {
        t.checked_sub(lag).and_then(|row| self.close[row])
    }

    pub fn row_passes(&self, t: usize) -> bool {
        Clause::ALL
            .iter()
            .all(|clause| self.clause_holds(*clause, t))
    }

    /// Clauses that reject row `t`, in declaration order.
    pub fn failed_clauses(&self, t: usize) -> Vec<Clause> {
        Clause::ALL
            .into_iter()
            .filter(|clause| !self.clause_holds(*clause, t))
            .collect()
    }

    pub fn clause_mask(&self, clause: Clause) -> Mask {
        (0..self.len()).map(|t| self.clause_holds(clause, t)).collect()
    }

    /// Conjunction of every clause mask, logging how many rows each clause
    /// keeps on its own.
    pub fn mask(&self) -> Mask {
        let mut entry = vec![true; self.len()];
        for clause in Clause::ALL {
            let clause_mask = self.clause_mask(clause);
            debug!(
                clause = clause.name(),
                passing = mask::count(&clause_mask),
                rows = self.len(),
                "Evaluated filter clause"
            );
            mask::and_assign(&mut entry, &clause_mask);
        }
        entry
    }
}

fn greater(lhs: Option<f64>, rhs: Option<f64>) -> bool {
    matches!((lhs, rhs), (Some(a), Some(b)) if a > b)
}

/// Membership predicate over an augmented table.
pub fn breakout_mask(table: &PriceTable) -> Result<Mask> {
    Ok(BreakoutInputs::from_table(table)?.mask())
}

/// Rows of the augmented table that pass every clause, in chronological order.
pub fn apply_filters(table: &PriceTable) -> Result<PriceTable> {
    let mask = breakout_mask(table)?;
    debug!(rows = ?mask::selected_rows(&mask), "Rows passing every clause");
    let filtered = table.filter(&mask)?;
    info!(
        rows = table.height(),
        matches = filtered.height(),
        "Applied breakout filters"
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::compute_indicators;

    fn present(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    /// Three rows where only the last one is inspected and it passes.
    fn passing_inputs() -> BreakoutInputs {
        BreakoutInputs {
            close: present(&[100.0, 100.0, 102.0]),
            volume: present(&[1_000.0, 1_000.0, 2_000.0]),
            high: present(&[101.0, 101.0, 103.0]),
            sma20_volume: vec![None, None, Some(1_000.0)],
            ema9: vec![Some(100.0), Some(100.0), Some(101.0)],
            ema13: vec![Some(100.0), Some(100.0), Some(100.0)],
            ema50: vec![Some(95.0), Some(95.0), Some(95.0)],
            ema200: vec![Some(90.0), Some(90.0), Some(90.0)],
            max_high_222: vec![None, None, Some(103.0)],
        }
    }

    fn assert_only_failure(inputs: &BreakoutInputs, clause: Clause) {
        assert_eq!(inputs.failed_clauses(2), vec![clause]);
        assert!(!inputs.row_passes(2));
        assert_eq!(inputs.mask(), vec![false, false, false]);
    }

    #[test]
    fn baseline_row_passes_every_clause() {
        let inputs = passing_inputs();
        assert!(inputs.failed_clauses(2).is_empty());
        assert_eq!(inputs.mask(), vec![false, false, true]);
    }

    #[test]
    fn price_below_floor_is_excluded() {
        let mut inputs = passing_inputs();
        inputs.close = present(&[45.0, 45.0, 45.9]);
        inputs.ema9[2] = Some(45.5);
        assert_only_failure(&inputs, Clause::PriceFloor);
    }

    #[test]
    fn gain_under_one_percent_is_excluded() {
        let mut inputs = passing_inputs();
        inputs.close[2] = Some(100.5);
        inputs.ema9[2] = Some(100.2);
        assert_only_failure(&inputs, Clause::DailyGain);
    }

    #[test]
    fn volume_without_surge_is_excluded() {
        let mut inputs = passing_inputs();
        inputs.volume[2] = Some(1_100.0);
        assert_only_failure(&inputs, Clause::VolumeSurge);
    }

    #[test]
    fn high_below_rolling_max_is_excluded() {
        let mut inputs = passing_inputs();
        inputs.max_high_222[2] = Some(104.0);
        assert_only_failure(&inputs, Clause::NewHigh);
    }

    #[test]
    fn sharp_prior_drop_is_excluded() {
        let mut inputs = passing_inputs();
        inputs.close[0] = Some(103.0);
        assert_only_failure(&inputs, Clause::NoPriorDrop);
    }

    #[test]
    fn medium_trend_below_long_trend_is_excluded() {
        let mut inputs = passing_inputs();
        inputs.ema13[2] = Some(94.0);
        assert_only_failure(&inputs, Clause::MediumTrend);
    }

    #[test]
    fn long_trend_below_very_long_trend_is_excluded() {
        let mut inputs = passing_inputs();
        inputs.ema200[2] = Some(96.0);
        assert_only_failure(&inputs, Clause::LongTrend);
    }

    #[test]
    fn close_under_short_ema_is_excluded() {
        let mut inputs = passing_inputs();
        inputs.ema9[2] = Some(103.0);
        assert_only_failure(&inputs, Clause::AboveShortTrend);
    }

    #[test]
    fn undefined_rolling_max_uses_zero_sentinel() {
        let mut inputs = passing_inputs();
        inputs.max_high_222[2] = None;
        assert_only_failure(&inputs, Clause::NewHigh);

        inputs.high[2] = Some(0.0);
        assert!(inputs.clause_holds(Clause::NewHigh, 2));
    }

    #[test]
    fn rows_without_lag_history_fail_lagged_clauses() {
        let inputs = passing_inputs();
        assert!(!inputs.clause_holds(Clause::DailyGain, 0));
        assert!(!inputs.clause_holds(Clause::NoPriorDrop, 0));
        assert!(!inputs.clause_holds(Clause::NoPriorDrop, 1));
    }

    #[test]
    fn undefined_volume_average_fails_volume_clause() {
        let mut inputs = passing_inputs();
        inputs.sma20_volume[2] = None;
        assert_only_failure(&inputs, Clause::VolumeSurge);
    }

    #[test]
    fn missing_raw_values_fail_the_clauses_that_read_them() {
        let mut inputs = passing_inputs();
        inputs.volume[2] = None;
        assert_only_failure(&inputs, Clause::VolumeSurge);

        let mut inputs = passing_inputs();
        inputs.high[2] = None;
        assert_only_failure(&inputs, Clause::NewHigh);

        let mut inputs = passing_inputs();
        inputs.close[0] = None;
        assert_only_failure(&inputs, Clause::NoPriorDrop);

        let mut inputs = passing_inputs();
        inputs.close[2] = None;
        assert_eq!(
            inputs.failed_clauses(2),
            vec![Clause::PriceFloor, Clause::DailyGain, Clause::AboveShortTrend]
        );
    }

    #[test]
    fn inputs_from_an_augmented_table_cover_every_row() -> crate::error::Result<()> {
        use polars::prelude::*;

        let frame = df!(
            "date" => &["2024-01-02", "2024-01-03", "2024-01-04"],
            "close" => &[Some(60.0), None, Some(61.0)],
            "volume" => &[1_000.0, 1_100.0, 1_200.0],
            "high" => &[60.5, 60.5, 61.5]
        )?;
        let augmented = compute_indicators(&PriceTable::from_frame(frame, None)?)?;
        let inputs = BreakoutInputs::from_table(&augmented)?;
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs.mask(), vec![false, false, false]);
        assert_eq!(breakout_mask(&augmented)?.len(), 3);
        Ok(())
    }
}
