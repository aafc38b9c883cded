// =============================================================================
// Indicator Engine
// =============================================================================
//
// Pure, side-effect-free augmentation of a price series with derived columns:
// moving average (SMA or EMA), rolling sample std-dev, Bollinger-style bands,
// and RSI. Output columns are aligned with the bars; rows without enough
// trailing history hold NAN and stay that way — no back-fill, no zero-fill.
//
// The engine never aborts for an out-of-range window: the window is clamped
// to a safe default and the clamp is reported on the result (plus a warning
// log), so the caller can surface it without treating it as a failure.

pub mod bollinger;
pub mod ma;
pub mod rsi;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::series::{IndicatorSeries, PriceSeries, WindowClamp};
use crate::types::MaKind;

/// Fallback window cap used when the requested window is unusable.
const DEFAULT_WINDOW_CAP: usize = 20;

/// Parameters for one indicator computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Moving-average / band / std-dev period.
    pub window: usize,
    /// RSI period.
    pub rsi_window: usize,
    pub ma_kind: MaKind,
    /// Band half-width in standard deviations.
    pub band_width: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            window: 20,
            rsi_window: 14,
            ma_kind: MaKind::Simple,
            band_width: 2.0,
        }
    }
}

/// Clamp an unusable window (`<= 1` or longer than the series) to
/// `max(2, min(series_len, 20))`.
fn effective_window(requested: usize, series_len: usize) -> (usize, Option<WindowClamp>) {
    if requested > 1 && requested <= series_len {
        return (requested, None);
    }
    let effective = series_len.min(DEFAULT_WINDOW_CAP).max(2);
    (
        effective,
        Some(WindowClamp {
            requested,
            effective,
        }),
    )
}

/// Compute all derived columns for `series` in one pass.
///
/// Total over its input domain: any series (including empty) and any
/// parameter values produce a well-formed result. Defined cells are always
/// finite; undefined cells are NAN.
pub fn compute_indicators(series: &PriceSeries, params: &IndicatorParams) -> IndicatorSeries {
    let closes = series.closes();

    let (window, clamp) = effective_window(params.window, closes.len());
    if let Some(c) = clamp {
        warn!(
            requested = c.requested,
            effective = c.effective,
            series_len = closes.len(),
            "moving-average window out of range, clamped"
        );
    }

    let moving_average = match params.ma_kind {
        MaKind::Simple => ma::sma_series(&closes, window),
        MaKind::Exponential => ma::ema_series(&closes, window),
    };
    let std_dev = bollinger::rolling_std_series(&closes, window);
    let (band_upper, band_lower) = bollinger::band_series(&moving_average, &std_dev, params.band_width);
    let rsi = rsi::rsi_series(&closes, params.rsi_window);

    IndicatorSeries {
        bars: series.bars().to_vec(),
        moving_average,
        std_dev,
        band_upper,
        band_lower,
        rsi,
        effective_window: window,
        window_clamp: clamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::bar_at;

    fn series_of(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar_at(i as u32 + 1, c))
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn linear_series(n: usize) -> PriceSeries {
        series_of(&(1..=n).map(|x| x as f64).collect::<Vec<_>>())
    }

    // ---- window clamping -------------------------------------------------

    #[test]
    fn oversized_window_clamps_to_20() {
        let series = linear_series(50);
        let out = compute_indicators(
            &series,
            &IndicatorParams {
                window: 200,
                ..Default::default()
            },
        );
        assert_eq!(out.effective_window, 20);
        assert_eq!(
            out.window_clamp,
            Some(WindowClamp {
                requested: 200,
                effective: 20
            })
        );
    }

    #[test]
    fn short_series_clamps_to_its_length() {
        let series = linear_series(5);
        let out = compute_indicators(
            &series,
            &IndicatorParams {
                window: 200,
                ..Default::default()
            },
        );
        assert_eq!(out.effective_window, 5);
    }

    #[test]
    fn window_of_one_clamps_up() {
        let series = linear_series(30);
        let out = compute_indicators(
            &series,
            &IndicatorParams {
                window: 1,
                ..Default::default()
            },
        );
        assert_eq!(out.effective_window, 20);
        assert!(out.window_clamp.is_some());
    }

    #[test]
    fn in_range_window_is_untouched() {
        let series = linear_series(30);
        let out = compute_indicators(
            &series,
            &IndicatorParams {
                window: 10,
                ..Default::default()
            },
        );
        assert_eq!(out.effective_window, 10);
        assert!(out.window_clamp.is_none());
    }

    // ---- column shape ----------------------------------------------------

    #[test]
    fn sma_columns_undefined_before_window_fills() {
        let series = linear_series(30);
        let params = IndicatorParams {
            window: 10,
            ..Default::default()
        };
        let out = compute_indicators(&series, &params);

        for column in [&out.moving_average, &out.std_dev, &out.band_upper, &out.band_lower] {
            assert_eq!(column.len(), 30);
            assert!(column[..9].iter().all(|v| v.is_nan()));
            assert!(column[9..].iter().all(|v| v.is_finite()));
        }
        assert!(out.rsi[..14].iter().all(|v| v.is_nan()));
        assert!(out.rsi[14..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn ema_defined_from_first_row_but_bands_wait_for_std() {
        let series = linear_series(30);
        let out = compute_indicators(
            &series,
            &IndicatorParams {
                window: 10,
                ma_kind: MaKind::Exponential,
                ..Default::default()
            },
        );
        assert!(out.moving_average.iter().all(|v| v.is_finite()));
        assert!(out.band_upper[..9].iter().all(|v| v.is_nan()));
        assert!(out.band_upper[9..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn bands_ordered_around_average_where_defined() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 8.0)
            .collect();
        let out = compute_indicators(&series_of(&closes), &IndicatorParams::default());
        for i in 0..closes.len() {
            let (ma, up, lo) = (out.moving_average[i], out.band_upper[i], out.band_lower[i]);
            if ma.is_nan() || up.is_nan() || lo.is_nan() {
                continue;
            }
            assert!(up >= ma && ma >= lo, "band ordering violated at row {i}");
        }
    }

    #[test]
    fn empty_series_yields_empty_columns() {
        let out = compute_indicators(&PriceSeries::empty(), &IndicatorParams::default());
        assert!(out.is_empty());
        assert!(out.moving_average.is_empty());
        assert!(out.rsi.is_empty());
    }

    #[test]
    fn defined_cells_are_never_non_finite() {
        let closes: Vec<f64> = (0..100)
            .map(|i| 50.0 * (1.0 + (i as f64 / 9.0).cos() * 0.3))
            .collect();
        let out = compute_indicators(
            &series_of(&closes),
            &IndicatorParams {
                window: 14,
                rsi_window: 7,
                ma_kind: MaKind::Exponential,
                band_width: 3.0,
            },
        );
        for column in [
            &out.moving_average,
            &out.std_dev,
            &out.band_upper,
            &out.band_lower,
            &out.rsi,
        ] {
            for v in column.iter() {
                assert!(v.is_nan() || v.is_finite());
            }
        }
    }
}
