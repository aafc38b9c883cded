// =============================================================================
// CSV export — the dashboard's downloadable table
// =============================================================================
//
// Semicolon-delimited, decimal comma, UTF-8: the spreadsheet-friendly dialect
// the dashboard has always offered for download. Undefined indicator cells
// are written as empty fields — an empty cell is a gap, a `0` would be a lie.
// =============================================================================

use anyhow::{Context, Result};

use crate::series::IndicatorSeries;

const HEADER: [&str; 12] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "adj_close",
    "volume",
    "moving_average",
    "std_dev",
    "band_upper",
    "band_lower",
    "rsi",
];

/// Render a value with a decimal comma; NAN becomes an empty cell.
fn cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string().replace('.', ",")
    }
}

/// Serialize the augmented series to CSV bytes, one row per bar.
pub fn indicator_series_to_csv(series: &IndicatorSeries) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());

    writer.write_record(HEADER).context("failed to write CSV header")?;

    for (i, bar) in series.bars.iter().enumerate() {
        writer
            .write_record([
                bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                cell(bar.open),
                cell(bar.high),
                cell(bar.low),
                cell(bar.close),
                cell(bar.adjusted_close),
                cell(bar.volume),
                cell(series.moving_average[i]),
                cell(series.std_dev[i]),
                cell(series.band_upper[i]),
                cell(series.band_lower[i]),
                cell(series.rsi[i]),
            ])
            .context("failed to write CSV row")?;
    }

    writer.into_inner().context("failed to flush CSV writer")
}
