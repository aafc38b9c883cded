// =============================================================================
// Analysis orchestration — one query in, one memoizable result out
// =============================================================================
//
// `AnalysisQuery` is the full value-identity of a computation: symbol,
// effective date range, granularity, indicator parameters, and risk-free
// rate. Because the engines are deterministic, equal queries always produce
// equal results, which is what makes the cache in `cache.rs` sound.
//
// The two real-valued parameters are held as `ParamF64`, which implements
// `Eq`/`Hash` over the bit pattern. NaN is rejected at construction so
// bit-equality and value-equality coincide.
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::RangeNotice;
use crate::indicators::{compute_indicators, IndicatorParams};
use crate::metrics::{compute_metrics, MetricsSnapshot};
use crate::series::{IndicatorSeries, PriceSeries};
use crate::types::{Granularity, MaKind};

/// An `f64` parameter usable in a hash key.
///
/// Bit-level `Eq`/`Hash`, safe because NaN is rejected at construction.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParamF64(f64);

impl ParamF64 {
    /// # Panics
    /// Panics if `value` is NaN — parameters are caller-supplied finite
    /// numbers, never the engine's undefined marker.
    pub fn new(value: f64) -> Self {
        assert!(!value.is_nan(), "parameter must not be NaN");
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for ParamF64 {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for ParamF64 {}

impl std::hash::Hash for ParamF64 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Value-identity of one analysis run. Two equal queries are guaranteed to
/// produce equal results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisQuery {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
    pub window: usize,
    pub rsi_window: usize,
    pub ma_kind: MaKind,
    pub band_width: ParamF64,
    pub risk_free_rate: ParamF64,
}

impl AnalysisQuery {
    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            window: self.window,
            rsi_window: self.rsi_window,
            ma_kind: self.ma_kind,
            band_width: self.band_width.value(),
        }
    }
}

/// Everything a presentation layer needs for one query: the augmented
/// series, the metrics snapshot, and the date-range adjustments that were
/// applied before fetching.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub granularity: Granularity,
    pub effective_start: NaiveDate,
    pub effective_end: NaiveDate,
    pub notices: Vec<RangeNotice>,
    pub series: IndicatorSeries,
    pub metrics: MetricsSnapshot,
}

/// Run both engines over an already-acquired series.
///
/// Callers are expected to have checked the series is non-empty; an empty
/// series still produces a well-formed (all-neutral) result rather than a
/// panic.
pub fn analyze(
    series: &PriceSeries,
    query: &AnalysisQuery,
    notices: Vec<RangeNotice>,
) -> AnalysisResult {
    let indicator_series = compute_indicators(series, &query.indicator_params());
    let metrics = compute_metrics(
        series,
        query.granularity.is_daily(),
        query.risk_free_rate.value(),
    );

    AnalysisResult {
        symbol: query.symbol.clone(),
        granularity: query.granularity,
        effective_start: query.start,
        effective_end: query.end,
        notices,
        series: indicator_series,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::bar_at;

    fn query() -> AnalysisQuery {
        AnalysisQuery {
            symbol: "AAPL".into(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            granularity: Granularity::Daily,
            window: 5,
            rsi_window: 3,
            ma_kind: MaKind::Simple,
            band_width: ParamF64::new(2.0),
            risk_free_rate: ParamF64::new(0.02),
        }
    }

    #[test]
    fn equal_queries_are_equal_keys() {
        assert_eq!(query(), query());
        let mut other = query();
        other.band_width = ParamF64::new(2.5);
        assert_ne!(query(), other);
    }

    #[test]
    #[should_panic(expected = "must not be NaN")]
    fn nan_parameter_is_rejected() {
        let _ = ParamF64::new(f64::NAN);
    }

    #[test]
    fn analyze_runs_both_engines() {
        let bars = (1..=20).map(|i| bar_at(i, 100.0 + i as f64)).collect();
        let series = PriceSeries::new(bars).unwrap();
        let result = analyze(&series, &query(), Vec::new());

        assert_eq!(result.series.len(), 20);
        assert_eq!(result.series.effective_window, 5);
        assert!(result.metrics.total_return_pct > 0.0);
        assert!(result.metrics.annualized_volatility_pct.is_some());
    }

    #[test]
    fn analyze_tolerates_empty_series() {
        let result = analyze(&PriceSeries::empty(), &query(), Vec::new());
        assert!(result.series.is_empty());
        assert_eq!(result.metrics.total_return_pct, 0.0);
    }
}
