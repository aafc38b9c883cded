// =============================================================================
// Metrics Engine — performance and risk scalars for one price series
// =============================================================================
//
// Five scalars per (series, risk-free-rate) pair:
//
//   total_return_pct          — last / first adjusted close, minus one
//   annualized_return_pct     — CAGR over the elapsed calendar span
//   max_drawdown_pct          — deepest peak-to-trough decline, adjusted close
//   annualized_volatility_pct — sqrt(252)-annualized std of per-bar returns
//   sharpe_ratio              — annualized excess return over volatility
//
// Volatility and Sharpe are daily-only: on any other granularity they are
// None ("not applicable"), which consumers must keep distinct from zero.
// Per-bar returns are taken from the raw close while the performance and
// drawdown metrics use the adjusted close; this asymmetry is inherited
// behavior and is kept on purpose (see DESIGN.md).
//
// Nothing here errors: short series, zero volatility, and non-finite
// intermediates all resolve to the neutral/undefined values below.
// =============================================================================

use serde::Serialize;

use crate::series::PriceSeries;

/// Trading days per year, the standard annualization base for daily bars.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Performance/risk snapshot. `None` fields serialize to JSON `null` and
/// must be rendered as "not applicable", never as a numeric zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub annualized_volatility_pct: Option<f64>,
    pub sharpe_ratio: Option<f64>,
}

impl MetricsSnapshot {
    /// Neutral snapshot: the defined result for series shorter than 2 bars.
    fn neutral() -> Self {
        Self {
            total_return_pct: 0.0,
            annualized_return_pct: 0.0,
            max_drawdown_pct: 0.0,
            annualized_volatility_pct: None,
            sharpe_ratio: None,
        }
    }
}

/// Compute the full snapshot.
///
/// `is_daily` gates volatility and Sharpe; `annual_risk_free_rate` is a
/// fraction (0.02 = 2 %) and only affects Sharpe.
pub fn compute_metrics(
    series: &PriceSeries,
    is_daily: bool,
    annual_risk_free_rate: f64,
) -> MetricsSnapshot {
    if series.len() < 2 {
        return MetricsSnapshot::neutral();
    }
    let mut snapshot = MetricsSnapshot::neutral();

    let adjusted = series.adjusted_closes();
    let first = adjusted[0];
    let last = adjusted[adjusted.len() - 1];

    snapshot.total_return_pct = (last / first - 1.0) * 100.0;
    snapshot.annualized_return_pct = annualized_return_pct(series, first, last);
    snapshot.max_drawdown_pct = max_drawdown_pct(&adjusted);

    // Per-bar simple returns from the raw close.
    let closes = series.closes();
    let returns: Vec<f64> = closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

    if is_daily && !returns.is_empty() {
        if let Some(std_dev) = sample_std(&returns) {
            snapshot.annualized_volatility_pct =
                Some(std_dev * TRADING_DAYS_PER_YEAR.sqrt() * 100.0);

            if std_dev != 0.0 {
                let mean = returns.iter().sum::<f64>() / returns.len() as f64;
                let daily_rf =
                    (1.0 + annual_risk_free_rate).powf(1.0 / TRADING_DAYS_PER_YEAR) - 1.0;
                snapshot.sharpe_ratio =
                    Some((mean - daily_rf) / std_dev * TRADING_DAYS_PER_YEAR.sqrt());
            }
        }
    }

    snapshot
}

/// CAGR over the elapsed calendar span between the first and last bar,
/// in percent. Degrades to 0.0 when the span is empty, the first price is
/// not positive, or the power produces a non-finite value.
fn annualized_return_pct(series: &PriceSeries, first: f64, last: f64) -> f64 {
    let (start, end) = match (series.first(), series.last()) {
        (Some(a), Some(b)) => (a.timestamp, b.timestamp),
        _ => return 0.0,
    };
    let years = (end - start).num_days() as f64 / 365.25;
    if years <= 0.0 || first <= 0.0 {
        return 0.0;
    }
    let cagr = (last / first).powf(1.0 / years) - 1.0;
    if cagr.is_finite() {
        cagr * 100.0
    } else {
        0.0
    }
}

/// Most negative excursion below the running peak, in percent (<= 0).
fn max_drawdown_pct(adjusted: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &price in adjusted {
        peak = peak.max(price);
        let drawdown = price / peak - 1.0;
        worst = worst.min(drawdown);
    }
    worst * 100.0
}

/// Sample (N-1 denominator) standard deviation; `None` below two samples.
fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (n as f64 - 1.0)).sqrt())
}
