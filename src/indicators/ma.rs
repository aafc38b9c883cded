// =============================================================================
// Moving averages — SMA and span-weighted EMA over closing prices
// =============================================================================
//
// Both functions return a column aligned with the input: one value per close.
//
//   SMA — arithmetic mean of the trailing `window` closes. The first
//         `window - 1` cells are NAN (not enough history).
//   EMA — span smoothing with alpha = 2 / (window + 1), no bias adjustment,
//         seeded directly from the first close. Defined from row 0.
// =============================================================================

/// Simple moving average column. Cells before the first full window are NAN.
pub fn sma_series(closes: &[f64], window: usize) -> Vec<f64> {
    let n = closes.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || window > n {
        return out;
    }

    let mut sum: f64 = closes[..window].iter().sum();
    out[window - 1] = sum / window as f64;
    for i in window..n {
        sum += closes[i] - closes[i - window];
        out[i] = sum / window as f64;
    }
    out
}

/// Exponential moving average column, defined for every row.
///
/// alpha = 2 / (window + 1); `ema[0] = closes[0]`, then
/// `ema[i] = alpha * closes[i] + (1 - alpha) * ema[i-1]`.
pub fn ema_series(closes: &[f64], window: usize) -> Vec<f64> {
    let n = closes.len();
    let mut out = vec![f64::NAN; n];
    if n == 0 || window == 0 {
        return out;
    }

    let alpha = 2.0 / (window as f64 + 1.0);
    let mut prev = closes[0];
    out[0] = prev;
    for i in 1..n {
        prev = alpha * closes[i] + (1.0 - alpha) * prev;
        out[i] = prev;
    }
    out
}
