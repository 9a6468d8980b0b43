use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::errors::AppError;
use crate::jobs::daily_analysis_job;
use crate::services::analysis_service::AnalysisContext;
use crate::telemetry::TelemetryEvent;

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub analysis: Arc<AnalysisContext>,
}

impl JobContext {
    fn pool(&self) -> &PgPool {
        &self.analysis.pool
    }
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(analysis: Arc<AnalysisContext>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context: JobContext { analysis },
        })
    }

    /// Start all scheduled jobs
    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        // Test mode shrinks the schedules so a dev run exercises the jobs quickly.
        let test_mode = std::env::var("JOB_SCHEDULER_TEST_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        if test_mode {
            info!("⚠️  JOB SCHEDULER IN TEST MODE - Jobs will run every few minutes!");
        }

        // (format: sec min hour day month weekday)
        let daily_schedule = if test_mode { "0 */2 * * * *" } else { "0 0 6 * * *" };
        let daily_desc = if test_mode { "Every 2 minutes (TEST MODE)" } else { "Daily at 6:00 AM UTC" };

        self.schedule_job(
            daily_schedule,
            "daily_sentiment_analysis",
            daily_desc,
            daily_analysis_job::run_daily_analysis,
        )
        .await?;

        self.schedule_job(
            "0 30 3 * * SUN",
            "prune_job_runs",
            "Every Sunday at 3:30 AM",
            prune_old_job_runs,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started successfully with 2 jobs");
        Ok(())
    }

    /// Stop the scheduler gracefully
    #[allow(dead_code)]
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    /// Helper to schedule a job with tracking
    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

// Job tracking wrapper
async fn execute_job_with_tracking<F, Fut>(job_name: &'static str, context: JobContext, job_fn: Arc<F>)
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let job_id = match record_job_start(context.pool(), job_name).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to record job start: {}", e);
            return;
        }
    };

    let telemetry = context.analysis.telemetry.clone();
    let result = job_fn(context.clone()).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, job_result.items_processed, job_result.items_failed, duration_ms
            );

            telemetry.emit(TelemetryEvent::JobRun {
                job: job_name,
                success: true,
                items_processed: job_result.items_processed,
                items_failed: job_result.items_failed,
                duration_ms,
            });

            if let Err(e) = record_job_success(
                context.pool(),
                job_id,
                job_result.items_processed,
                job_result.items_failed,
                duration_ms,
            )
            .await
            {
                error!("Failed to record job success: {}", e);
            }
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);

            telemetry.emit(TelemetryEvent::JobRun {
                job: job_name,
                success: false,
                items_processed: 0,
                items_failed: 0,
                duration_ms,
            });

            if let Err(e) = record_job_failure(context.pool(), job_id, &e.to_string(), duration_ms).await {
                error!("Failed to record job failure: {}", e);
            }
        }
    }
}

// Database functions for job tracking
async fn record_job_start(pool: &PgPool, job_name: &str) -> Result<i32, AppError> {
    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO job_runs (job_name, status)
        VALUES ($1, 'running'::job_status)
        RETURNING id
        "#,
    )
    .bind(job_name)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn record_job_success(
    pool: &PgPool,
    job_id: i32,
    items_processed: i32,
    items_failed: i32,
    duration_ms: i64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE job_runs
        SET completed_at = NOW(),
            status = 'success'::job_status,
            items_processed = $2,
            items_failed = $3,
            duration_ms = $4
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .bind(items_processed)
    .bind(items_failed)
    .bind(duration_ms)
    .execute(pool)
    .await?;

    Ok(())
}

async fn record_job_failure(
    pool: &PgPool,
    job_id: i32,
    error_message: &str,
    duration_ms: i64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE job_runs
        SET completed_at = NOW(),
            status = 'failed'::job_status,
            error_message = $2,
            duration_ms = $3
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .bind(error_message)
    .bind(duration_ms)
    .execute(pool)
    .await?;

    Ok(())
}

/// Weekly housekeeping: tracking rows older than 90 days carry no signal.
pub async fn prune_old_job_runs(ctx: JobContext) -> Result<JobResult, AppError> {
    let result = sqlx::query("DELETE FROM job_runs WHERE started_at < NOW() - INTERVAL '90 days'")
        .execute(ctx.pool())
        .await?;

    info!("🧹 Pruned {} old job run records", result.rows_affected());

    Ok(JobResult {
        items_processed: result.rows_affected() as i32,
        items_failed: 0,
    })
}
