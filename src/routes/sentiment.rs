use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::info;

use crate::db::asset_queries;
use crate::errors::AppError;
use crate::models::{ApiResponse, DashboardData, HistoricalSeries};
use crate::services::dashboard_service;
use crate::state::AppState;
use crate::telemetry::TelemetryEvent;

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub ticker: Option<String>,
    /// Number of days in the window (default: 7)
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

/// GET /api/sentiment
/// All assets with their latest record, top picks, and summary metrics.
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardData>>, AppError> {
    let started = Instant::now();
    info!("Fetching sentiment dashboard");

    let data = dashboard_service::build_dashboard(&state.pool).await?;

    state.telemetry.emit(TelemetryEvent::ApiCall {
        endpoint: "/api/sentiment",
        duration_ms: started.elapsed().as_millis() as i64,
        status: 200,
    });

    Ok(Json(ApiResponse::ok(data)))
}

/// GET /api/sentiment/history?ticker=NVDA&days=7
pub async fn get_history(
    Query(params): Query<HistoryParams>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HistoricalSeries>>, AppError> {
    let started = Instant::now();

    let ticker = params
        .ticker
        .ok_or_else(|| AppError::Validation("Ticker parameter is required".to_string()))?;

    if params.days < 1 {
        return Err(AppError::Validation("days must be at least 1".to_string()));
    }

    if asset_queries::fetch_by_ticker(&state.pool, &ticker)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    info!("Fetching sentiment history for {} ({} days)", ticker, params.days);

    let series = dashboard_service::history_series(&state.pool, &ticker, params.days).await?;

    state.telemetry.emit(TelemetryEvent::ApiCall {
        endpoint: "/api/sentiment/history",
        duration_ms: started.elapsed().as_millis() as i64,
        status: 200,
    });

    Ok(Json(ApiResponse::ok(series)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_dashboard))
        .route("/history", get(get_history))
}
