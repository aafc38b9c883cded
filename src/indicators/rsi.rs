// =============================================================================
// Relative Strength Index — rolling-mean (Cutler) variant
// =============================================================================
//
// Step 1 — per-bar close deltas.
// Step 2 — gains  = delta where delta > 0, else 0
//          losses = |delta| where delta < 0, else 0
// Step 3 — simple rolling means of gains and losses over `window` deltas
//          (plain arithmetic means, not Wilder smoothing).
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Division-by-zero policy: an average loss of exactly zero yields RSI 100.0.
// A defined cell is never non-finite.
// =============================================================================

/// RSI column aligned with the input closes.
///
/// Row `i` needs `window` deltas ending at `i`, so the first `window` cells
/// are NAN (one more than the moving-average prefix: delta 0 does not exist).
pub fn rsi_series(closes: &[f64], window: usize) -> Vec<f64> {
    let n = closes.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window + 1 {
        return out;
    }

    let window_f = window as f64;
    let mut gain_sum = 0.0_f64;
    let mut loss_sum = 0.0_f64;

    // Deltas are indexed by the row they end on: delta(i) = close[i] - close[i-1].
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            gain_sum += delta;
        } else {
            loss_sum += -delta;
        }

        // Retire the delta that fell out of the trailing window.
        if i > window {
            let old = closes[i - window] - closes[i - window - 1];
            if old > 0.0 {
                gain_sum -= old;
            } else {
                loss_sum -= -old;
            }
        }

        if i >= window {
            let avg_gain = gain_sum / window_f;
            let avg_loss = loss_sum / window_f;
            out[i] = if avg_loss <= 0.0 {
                100.0
            } else {
                let rs = avg_gain / avg_loss;
                100.0 - 100.0 / (1.0 + rs)
            };
        }
    }
    out
}
