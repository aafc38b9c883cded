// =============================================================================
// Price series model — ordered OHLCV bars plus derived indicator columns
// =============================================================================
//
// A `PriceSeries` is built once per acquisition call and never mutated.
// Derived indicator columns live in `IndicatorSeries`, aligned row-for-row
// with the bars; cells without enough trailing history hold `f64::NAN`.
// NAN is the wire-visible "undefined" marker: serde_json emits it as `null`,
// which chart consumers must render as a gap, never as zero.
// =============================================================================

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single OHLCV bar. Timestamps are tz-naive by contract — the provider
/// strips any timezone offset before the series is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Dividend/split-adjusted close. Equals `close` when the provider has
    /// no adjustment data.
    pub adjusted_close: f64,
    pub volume: f64,
}

/// An ordered series of bars, strictly increasing in time.
///
/// May be empty — an acquisition failure yields an empty series and callers
/// must check [`is_empty`](Self::is_empty) before running the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, validating the ordering invariant.
    ///
    /// # Errors
    /// Fails when timestamps are not strictly increasing (out of order or
    /// duplicated).
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        for pair in bars.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                bail!(
                    "bars out of order: {} followed by {}",
                    pair[0].timestamp,
                    pair[1].timestamp
                );
            }
        }
        Ok(Self { bars })
    }

    /// An empty series, the defined result of a failed acquisition.
    pub fn empty() -> Self {
        Self { bars: Vec::new() }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Closing prices, in order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Adjusted closing prices, in order.
    pub fn adjusted_closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.adjusted_close).collect()
    }
}

/// Notice that the requested moving-average window was out of range and the
/// engine substituted a safe default instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowClamp {
    pub requested: usize,
    pub effective: usize,
}

/// A `PriceSeries` augmented with derived indicator columns.
///
/// Every column has the same length as `bars`; `NAN` cells mark rows where
/// the rolling window had insufficient history. Consumers must preserve the
/// gaps — they are part of the contract, not missing data to be filled.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSeries {
    pub bars: Vec<Bar>,
    pub moving_average: Vec<f64>,
    pub std_dev: Vec<f64>,
    pub band_upper: Vec<f64>,
    pub band_lower: Vec<f64>,
    pub rsi: Vec<f64>,
    /// The window actually used for the moving average, std-dev, and bands.
    pub effective_window: usize,
    /// Present when the requested window was clamped.
    pub window_clamp: Option<WindowClamp>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn bar_at(day: u32, close: f64) -> Bar {
    use chrono::{Days, NaiveDate};
    let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(u64::from(day) - 1))
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    Bar {
        timestamp: ts,
        open: close,
        high: close,
        low: close,
        close,
        adjusted_close: close,
        volume: 1_000.0,
    }
}
