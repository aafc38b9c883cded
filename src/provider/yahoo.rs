// =============================================================================
// Yahoo Finance chart API client
// =============================================================================
//
// One endpoint: GET /v8/finance/chart/{symbol}. Response decoding is split
// into a pure function (`parse_chart_response`) so the payload handling is
// testable without a network.
//
// Provider quirks handled here:
//   - intraday history is only served inside a bounded trailing window, so
//     intraday requests fetch the provider's full window and filter to the
//     caller's range afterwards;
//   - daily requests treat the end date as inclusive (period2 = end + 1 day);
//   - rows with a null close are gaps in the provider data and are dropped;
//   - the adjclose block is optional; absent means adjusted == close;
//   - epoch timestamps become tz-naive UTC datetimes (the offset is dropped).
// =============================================================================

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::series::{Bar, PriceSeries};
use crate::types::Granularity;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Market-data client for the Yahoo Finance v8 chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at an alternate host (test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        // The chart endpoint rejects clients without a browser-ish UA.
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Mozilla/5.0 (compatible; quotelab/1.0)"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch OHLCV bars for `[start, end]` (dates inclusive) at `granularity`.
    ///
    /// An empty `PriceSeries` is a valid result (no rows in range); transport,
    /// decode, and provider-reported errors surface as `anyhow::Error`.
    pub async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<PriceSeries> {
        let now = Utc::now();
        let (period1, period2) = request_window(start, end, granularity, now);

        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}&events=div%2Csplit&includeAdjustedClose=true",
            self.base_url,
            symbol,
            period1,
            period2,
            granularity.as_str(),
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("chart request for {symbol} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("chart request for {symbol} returned {status}: {body}");
        }

        let payload: ChartResponse = resp
            .json()
            .await
            .with_context(|| format!("failed to decode chart response for {symbol}"))?;

        let series = parse_chart_response(payload)
            .with_context(|| format!("chart payload for {symbol} was malformed"))?;

        // Intraday requests pull the provider's whole window; cut it down to
        // what the caller asked for. Daily requests already match the range.
        let series = filter_to_range(series, start, end)?;

        debug!(
            symbol,
            interval = %granularity,
            bars = series.len(),
            "chart data retrieved"
        );
        Ok(series)
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Epoch-second request bounds. Intraday granularities request the provider's
/// maximum trailing window ending now; daily requests span the exact dates
/// with an inclusive end.
fn request_window(
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
    now: DateTime<Utc>,
) -> (i64, i64) {
    match granularity {
        Granularity::Daily => {
            let p1 = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
            let inclusive_end = end.checked_add_days(Days::new(1)).unwrap_or(end);
            let p2 = inclusive_end
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
                .timestamp();
            (p1, p2)
        }
        _ => {
            let span = granularity.history_limit_days();
            let p1 = (now - chrono::Duration::days(span)).timestamp();
            (p1, now.timestamp())
        }
    }
}

/// Keep only bars whose date falls inside `[start, end]`.
fn filter_to_range(series: PriceSeries, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
    let bars: Vec<Bar> = series
        .bars()
        .iter()
        .filter(|b| {
            let d = b.timestamp.date();
            d >= start && d <= end
        })
        .cloned()
        .collect();
    PriceSeries::new(bars)
}

// =============================================================================
// Payload shape
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Option<Vec<AdjCloseBlock>>,
}

/// Per-field arrays aligned with `timestamp`; individual cells may be null.
#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Pure payload-to-series conversion.
///
/// # Errors
/// Fails when the provider reports an error object or the payload carries no
/// result block. A result block with no timestamps is an empty series, not
/// an error.
pub fn parse_chart_response(payload: ChartResponse) -> Result<PriceSeries> {
    if let Some(err) = payload.chart.error {
        if !err.is_null() {
            bail!("provider error: {err}");
        }
    }

    let mut results = payload
        .chart
        .result
        .context("chart payload has no result block")?;
    if results.is_empty() {
        bail!("chart payload has an empty result block");
    }
    let result = results.remove(0);

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .and_then(|mut blocks| {
            if blocks.is_empty() {
                None
            } else {
                Some(blocks.remove(0).adjclose)
            }
        })
        .unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    let mut last_ts = None;

    for (i, &epoch) in result.timestamp.iter().enumerate() {
        // A null close means the provider has no bar here.
        let close = match quote.close.get(i).copied().flatten() {
            Some(c) => c,
            None => {
                skipped += 1;
                continue;
            }
        };
        let Some(ts) = DateTime::from_timestamp(epoch, 0) else {
            skipped += 1;
            continue;
        };
        let ts = ts.naive_utc();

        // The provider occasionally repeats the live bar's timestamp; keep
        // the first occurrence so the ordering invariant holds.
        if last_ts.is_some_and(|prev| ts <= prev) {
            skipped += 1;
            continue;
        }
        last_ts = Some(ts);

        let cell = |col: &[Option<f64>]| col.get(i).copied().flatten();
        bars.push(Bar {
            timestamp: ts,
            open: cell(&quote.open).unwrap_or(close),
            high: cell(&quote.high).unwrap_or(close),
            low: cell(&quote.low).unwrap_or(close),
            close,
            adjusted_close: cell(&adjclose).unwrap_or(close),
            volume: cell(&quote.volume).unwrap_or(0.0),
        });
    }

    if skipped > 0 {
        warn!(skipped, kept = bars.len(), "dropped incomplete provider rows");
    }
    PriceSeries::new(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> ChartResponse {
        serde_json::from_value(value).unwrap()
    }

    fn three_day_payload() -> serde_json::Value {
        // 2024-01-01 .. 2024-01-03, midnight UTC.
        json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "TEST"},
                    "timestamp": [1704067200, 1704153600, 1704240000],
                    "indicators": {
                        "quote": [{
                            "open":   [99.0, 101.0, 110.5],
                            "high":   [101.5, 111.0, 111.0],
                            "low":    [98.0, 100.5, 98.5],
                            "close":  [100.0, 110.0, 99.0],
                            "volume": [1000.0, 1500.0, 2000.0]
                        }],
                        "adjclose": [{"adjclose": [99.5, 109.5, 98.5]}]
                    }
                }],
                "error": null
            }
        })
    }

    #[test]
    fn parses_complete_payload() {
        let series = parse_chart_response(payload(three_day_payload())).unwrap();
        assert_eq!(series.len(), 3);
        let bar = &series.bars()[1];
        assert_eq!(bar.close, 110.0);
        assert_eq!(bar.adjusted_close, 109.5);
        assert_eq!(bar.timestamp.and_utc().timestamp(), 1704153600);
    }

    #[test]
    fn missing_adjclose_falls_back_to_close() {
        let mut value = three_day_payload();
        value["chart"]["result"][0]["indicators"]
            .as_object_mut()
            .unwrap()
            .remove("adjclose");
        let series = parse_chart_response(payload(value)).unwrap();
        assert_eq!(series.bars()[0].adjusted_close, 100.0);
        assert_eq!(series.bars()[2].adjusted_close, 99.0);
    }

    #[test]
    fn null_close_rows_are_dropped() {
        let mut value = three_day_payload();
        value["chart"]["result"][0]["indicators"]["quote"][0]["close"] =
            json!([100.0, null, 99.0]);
        let series = parse_chart_response(payload(value)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[1].close, 99.0);
    }

    #[test]
    fn duplicate_timestamps_keep_first_occurrence() {
        let mut value = three_day_payload();
        value["chart"]["result"][0]["timestamp"] = json!([1704067200, 1704067200, 1704240000]);
        let series = parse_chart_response(payload(value)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[0].close, 100.0);
    }

    #[test]
    fn provider_error_is_reported() {
        let value = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        });
        assert!(parse_chart_response(payload(value)).is_err());
    }

    #[test]
    fn empty_timestamps_is_an_empty_series() {
        let value = json!({
            "chart": {
                "result": [{
                    "indicators": {"quote": [{}]}
                }],
                "error": null
            }
        });
        let series = parse_chart_response(payload(value)).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn daily_request_window_is_end_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let (p1, p2) = request_window(start, end, Granularity::Daily, Utc::now());
        assert_eq!(p1, 1704067200);
        // period2 covers all of 2024-01-03.
        assert_eq!(p2, 1704067200 + 3 * 86_400);
    }

    #[test]
    fn intraday_request_window_spans_the_provider_limit() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let now = Utc::now();
        let (p1, p2) = request_window(start, end, Granularity::FifteenMin, now);
        assert_eq!(p2, now.timestamp());
        assert_eq!(p2 - p1, 60 * 86_400);
    }

    #[test]
    fn filter_to_range_cuts_by_date() {
        let series = parse_chart_response(payload(three_day_payload())).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let filtered = filter_to_range(series, start, end).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.bars()[0].close, 110.0);
    }
}
