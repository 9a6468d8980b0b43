use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::services::analysis_service::{self, BatchReport};
use crate::state::AppState;

/// GET|POST /api/cron/daily-analysis
///
/// Re-runs the full aggregation pipeline for every known asset. Guarded by
/// the shared cron secret in production so only the scheduler can hit it.
pub async fn trigger_daily_analysis(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BatchReport>>, AppError> {
    if state.config.is_production() {
        let expected = state
            .config
            .cron_secret
            .as_deref()
            .ok_or(AppError::Unauthorized)?;

        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("Bearer {expected}"))
            .unwrap_or(false);

        if !authorized {
            warn!("Rejected cron trigger with missing or bad secret");
            return Err(AppError::Unauthorized);
        }
    }

    info!("Cron trigger: starting daily sentiment analysis");

    let report = analysis_service::run_batch(&state.analysis).await?;

    Ok(Json(ApiResponse::ok(report)))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/daily-analysis",
        get(trigger_daily_analysis).post(trigger_daily_analysis),
    )
}
