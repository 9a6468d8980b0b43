use tracing::{info, warn};

use crate::errors::AppError;
use crate::services::analysis_service;
use crate::services::job_scheduler_service::{JobContext, JobResult};

/// Scheduled entry point for the daily batch. The same pipeline backs the
/// HTTP trigger endpoint; this wrapper only adapts it to job tracking.
pub async fn run_daily_analysis(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("📊 Running scheduled daily sentiment analysis...");

    let report = analysis_service::run_batch(&ctx.analysis).await?;

    for outcome in report.results.iter().filter(|r| !r.success) {
        warn!(
            ticker = %outcome.ticker,
            error = outcome.error.as_deref().unwrap_or("unknown"),
            "asset failed during scheduled analysis"
        );
    }

    Ok(JobResult {
        items_processed: report.summary.successful,
        items_failed: report.summary.failed,
    })
}
