// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Three endpoints under `/api/v1/`:
//
//   GET /api/v1/health        — liveness probe
//   GET /api/v1/analysis      — augmented series + metrics as JSON
//   GET /api/v1/analysis/csv  — the same table as a CSV download
//
// The analysis response carries the series as a mapping of aligned arrays;
// undefined indicator cells are JSON `null` and must be rendered as gaps.
// CORS is configured permissively: this is a single-user local backend.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{analyze, AnalysisQuery, AnalysisResult, ParamF64};
use crate::app_state::AppState;
use crate::dates::{normalize_range, RangeNotice};
use crate::export::indicator_series_to_csv;
use crate::metrics::MetricsSnapshot;
use crate::series::WindowClamp;
use crate::types::{Granularity, MaKind};

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analysis", get(analysis_json))
        .route("/api/v1/analysis/csv", get(analysis_csv))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

/// A handler-level failure with an HTTP status. Nothing in the computation
/// core produces these; they come from bad query parameters or the
/// acquisition boundary.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Analysis request
// =============================================================================

fn default_window() -> usize {
    20
}

fn default_rsi_window() -> usize {
    14
}

fn default_band_width() -> f64 {
    2.0
}

/// Query parameters for both analysis endpoints. Everything is optional;
/// defaults mirror the dashboard's initial widget values.
#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    symbol: Option<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    #[serde(default)]
    interval: Granularity,
    #[serde(default)]
    ma: MaKind,
    #[serde(default = "default_window")]
    window: usize,
    #[serde(default = "default_rsi_window")]
    rsi_window: usize,
    #[serde(default = "default_band_width")]
    band_width: f64,
    risk_free_rate: Option<f64>,
}

/// Resolve the request into a cache key, validating the numeric parameters.
fn build_query(
    req: &AnalysisRequest,
    state: &AppState,
    today: NaiveDate,
) -> Result<(AnalysisQuery, Vec<RangeNotice>), ApiError> {
    if !req.band_width.is_finite() || req.band_width <= 0.0 {
        return Err(ApiError::bad_request("band_width must be a positive number"));
    }
    let risk_free_rate = req
        .risk_free_rate
        .unwrap_or(state.config.default_risk_free_rate);
    if !risk_free_rate.is_finite() {
        return Err(ApiError::bad_request("risk_free_rate must be finite"));
    }

    let symbol = req
        .symbol
        .as_deref()
        .unwrap_or(&state.config.default_symbol)
        .trim()
        .to_uppercase();
    if symbol.is_empty() {
        return Err(ApiError::bad_request("symbol must not be empty"));
    }

    // Default range: the dashboard opens on the trailing two years.
    let start = req
        .start
        .unwrap_or_else(|| today.checked_sub_days(Days::new(730)).unwrap_or(today));
    let end = req.end.unwrap_or(today);
    let (start, end, notices) = normalize_range(start, end, today, req.interval);

    Ok((
        AnalysisQuery {
            symbol,
            start,
            end,
            granularity: req.interval,
            window: req.window,
            rsi_window: req.rsi_window,
            ma_kind: req.ma,
            band_width: ParamF64::new(req.band_width),
            risk_free_rate: ParamF64::new(risk_free_rate),
        },
        notices,
    ))
}

/// Shared fetch-and-compute path for both analysis endpoints, with the
/// memoization cache in front.
async fn run_analysis(
    state: &AppState,
    req: &AnalysisRequest,
) -> Result<Arc<AnalysisResult>, ApiError> {
    let today = Utc::now().date_naive();
    let (query, notices) = build_query(req, state, today)?;

    if let Some(cached) = state.cache.get(&query) {
        return Ok(cached);
    }

    let series = state
        .provider
        .fetch(&query.symbol, query.start, query.end, query.granularity)
        .await
        .map_err(|e| {
            warn!(symbol = %query.symbol, error = %e, "acquisition failed");
            ApiError::bad_gateway(format!("failed to fetch data for {}: {e}", query.symbol))
        })?;

    // The engines tolerate an empty series, but an empty result is useless
    // to the dashboard; report it before computing anything.
    if series.is_empty() {
        return Err(ApiError::not_found(format!(
            "no data for {} between {} and {} at {}",
            query.symbol, query.start, query.end, query.granularity
        )));
    }

    info!(
        symbol = %query.symbol,
        interval = %query.granularity,
        bars = series.len(),
        "computing analysis"
    );
    let result = Arc::new(analyze(&series, &query, notices));
    state.cache.insert(query, Arc::clone(&result));
    Ok(result)
}

// =============================================================================
// Analysis response (JSON)
// =============================================================================

/// The augmented series as aligned columns. NAN serializes to `null`.
#[derive(Serialize)]
struct SeriesColumns {
    timestamps: Vec<String>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    adj_close: Vec<f64>,
    volume: Vec<f64>,
    moving_average: Vec<f64>,
    std_dev: Vec<f64>,
    band_upper: Vec<f64>,
    band_lower: Vec<f64>,
    rsi: Vec<f64>,
}

#[derive(Serialize)]
struct AnalysisResponse {
    symbol: String,
    granularity: Granularity,
    effective_start: NaiveDate,
    effective_end: NaiveDate,
    effective_window: usize,
    window_clamp: Option<WindowClamp>,
    notices: Vec<RangeNotice>,
    series: SeriesColumns,
    metrics: MetricsSnapshot,
}

fn build_response(result: &AnalysisResult) -> AnalysisResponse {
    let s = &result.series;
    AnalysisResponse {
        symbol: result.symbol.clone(),
        granularity: result.granularity,
        effective_start: result.effective_start,
        effective_end: result.effective_end,
        effective_window: s.effective_window,
        window_clamp: s.window_clamp,
        notices: result.notices.clone(),
        series: SeriesColumns {
            timestamps: s
                .bars
                .iter()
                .map(|b| b.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string())
                .collect(),
            open: s.bars.iter().map(|b| b.open).collect(),
            high: s.bars.iter().map(|b| b.high).collect(),
            low: s.bars.iter().map(|b| b.low).collect(),
            close: s.bars.iter().map(|b| b.close).collect(),
            adj_close: s.bars.iter().map(|b| b.adjusted_close).collect(),
            volume: s.bars.iter().map(|b| b.volume).collect(),
            moving_average: s.moving_average.clone(),
            std_dev: s.std_dev.clone(),
            band_upper: s.band_upper.clone(),
            band_lower: s.band_lower.clone(),
            rsi: s.rsi.clone(),
        },
        metrics: result.metrics.clone(),
    }
}

async fn analysis_json(
    State(state): State<Arc<AppState>>,
    Query(req): Query<AnalysisRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = run_analysis(&state, &req).await?;
    Ok(Json(build_response(&result)))
}

// =============================================================================
// Analysis response (CSV download)
// =============================================================================

async fn analysis_csv(
    State(state): State<Arc<AppState>>,
    Query(req): Query<AnalysisRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = run_analysis(&state, &req).await?;
    let bytes = indicator_series_to_csv(&result.series).map_err(|e| {
        warn!(error = %e, "CSV serialization failed");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "failed to serialize CSV".to_string(),
        }
    })?;

    let filename = format!("{}_{}.csv", result.symbol, result.granularity);
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::bar_at;
    use crate::series::PriceSeries;

    fn sample_result() -> AnalysisResult {
        let bars = (1..=30).map(|i| bar_at(i, 100.0 + i as f64)).collect();
        let series = PriceSeries::new(bars).unwrap();
        let query = AnalysisQuery {
            symbol: "AAPL".into(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 30).unwrap(),
            granularity: Granularity::Daily,
            window: 10,
            rsi_window: 14,
            ma_kind: MaKind::Simple,
            band_width: ParamF64::new(2.0),
            risk_free_rate: ParamF64::new(0.02),
        };
        analyze(&series, &query, Vec::new())
    }

    #[test]
    fn response_columns_stay_aligned() {
        let response = build_response(&sample_result());
        let s = &response.series;
        let n = s.timestamps.len();
        assert_eq!(n, 30);
        for len in [
            s.open.len(),
            s.close.len(),
            s.adj_close.len(),
            s.volume.len(),
            s.moving_average.len(),
            s.std_dev.len(),
            s.band_upper.len(),
            s.band_lower.len(),
            s.rsi.len(),
        ] {
            assert_eq!(len, n);
        }
    }

    #[test]
    fn undefined_cells_serialize_as_null() {
        let response = build_response(&sample_result());
        let value = serde_json::to_value(&response).unwrap();
        // First moving-average cell is inside the warm-up window.
        assert!(value["series"]["moving_average"][0].is_null());
        assert!(value["series"]["moving_average"][29].is_f64());
        assert!(value["series"]["rsi"][0].is_null());
    }

    #[test]
    fn request_defaults_apply() {
        let req: AnalysisRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.window, 20);
        assert_eq!(req.rsi_window, 14);
        assert_eq!(req.band_width, 2.0);
        assert_eq!(req.interval, Granularity::Daily);
        assert_eq!(req.ma, MaKind::Simple);
        assert!(req.symbol.is_none());
    }

    #[test]
    fn build_query_rejects_bad_band_width() {
        let state = AppState::new(crate::runtime_config::RuntimeConfig::default());
        let mut req: AnalysisRequest = serde_json::from_str("{}").unwrap();
        req.band_width = -1.0;
        let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        assert!(build_query(&req, &state, today).is_err());
    }

    #[test]
    fn build_query_uppercases_and_defaults_symbol() {
        let state = AppState::new(crate::runtime_config::RuntimeConfig::default());
        let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();

        let mut req: AnalysisRequest = serde_json::from_str("{}").unwrap();
        req.symbol = Some("msft ".into());
        let (query, _) = build_query(&req, &state, today).unwrap();
        assert_eq!(query.symbol, "MSFT");

        let req: AnalysisRequest = serde_json::from_str("{}").unwrap();
        let (query, _) = build_query(&req, &state, today).unwrap();
        assert_eq!(query.symbol, "AAPL");
    }

    #[test]
    fn build_query_clamps_intraday_start() {
        let state = AppState::new(crate::runtime_config::RuntimeConfig::default());
        let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let mut req: AnalysisRequest = serde_json::from_str("{}").unwrap();
        req.interval = Granularity::FifteenMin;
        req.start = Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        req.end = Some(today);

        let (query, notices) = build_query(&req, &state, today).unwrap();
        assert_eq!(query.start, NaiveDate::from_ymd_opt(2026, 6, 2).unwrap());
        assert_eq!(notices.len(), 1);
    }
}
