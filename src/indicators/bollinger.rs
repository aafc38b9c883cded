// =============================================================================
// Bollinger bands — rolling sample standard deviation around a moving average
// =============================================================================
//
//   upper = ma + width * sigma
//   lower = ma - width * sigma
//
// Sigma is the sample (N-1 denominator) standard deviation of the trailing
// `window` closes. The band columns inherit NAN wherever either the moving
// average or the std-dev cell is NAN, so an EMA (defined from row 0) still
// produces bands only once the std window has filled.
// =============================================================================

/// Rolling sample standard deviation column. Cells before the first full
/// window are NAN. Windows of fewer than two observations have no sample
/// statistic and yield an all-NAN column.
pub fn rolling_std_series(closes: &[f64], window: usize) -> Vec<f64> {
    let n = closes.len();
    let mut out = vec![f64::NAN; n];
    if window < 2 || window > n {
        return out;
    }

    // Two-pass per window: mean, then squared deviations. Windows are small
    // (tens of bars) so the quadratic cost is irrelevant and the numerics
    // stay honest, unlike a running sum-of-squares.
    for i in (window - 1)..n {
        let slice = &closes[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let ss: f64 = slice.iter().map(|x| (x - mean).powi(2)).sum();
        out[i] = (ss / (window as f64 - 1.0)).sqrt();
    }
    out
}

/// Band columns from aligned moving-average and std-dev columns.
/// NAN in either input propagates to both bands.
pub fn band_series(ma: &[f64], std_dev: &[f64], width: f64) -> (Vec<f64>, Vec<f64>) {
    let upper = ma
        .iter()
        .zip(std_dev)
        .map(|(m, s)| m + width * s)
        .collect();
    let lower = ma
        .iter()
        .zip(std_dev)
        .map(|(m, s)| m - width * s)
        .collect();
    (upper, lower)
}
