use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::services::analysis_service::AnalysisContext;
use crate::telemetry::Telemetry;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub analysis: Arc<AnalysisContext>,
    pub telemetry: Arc<dyn Telemetry>,
}
