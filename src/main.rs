mod app;
mod config;
mod db;
mod errors;
mod external;
mod jobs;
mod logging;
mod models;
mod routes;
mod services;
mod state;
mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::external::forum::ForumSource;
use crate::external::microblog::MicroblogSource;
use crate::external::newswire::NewswireSource;
use crate::external::yahoo::YahooQuoteProvider;
use crate::logging::LoggingConfig;
use crate::services::analysis_service::AnalysisContext;
use crate::services::job_scheduler_service::JobSchedulerService;
use crate::services::narrative_service::{CaseGenerator, DisabledCaseGenerator, XaiCaseGenerator};
use crate::services::rate_limiter::RateLimiter;
use crate::state::AppState;
use crate::telemetry::{Telemetry, TracingTelemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let telemetry: Arc<dyn Telemetry> = Arc::new(TracingTelemetry);

    let cases: Arc<dyn CaseGenerator> = match config.case_api_key.clone() {
        Some(key) => {
            tracing::info!("🗞️  Narrative case generation enabled");
            Arc::new(XaiCaseGenerator::new(key))
        }
        None => {
            tracing::info!("🗞️  No XAI_API_KEY set, using static narrative fallbacks");
            Arc::new(DisabledCaseGenerator)
        }
    };

    let analysis = Arc::new(AnalysisContext {
        pool: pool.clone(),
        quotes: Arc::new(YahooQuoteProvider::new()),
        forum: Arc::new(ForumSource::new()),
        microblog: Arc::new(MicroblogSource::new()),
        news: Arc::new(NewswireSource::new(config.news_api_key.clone())),
        cases,
        // Free tiers across the upstreams tolerate roughly two calls a second.
        rate_limiter: Arc::new(RateLimiter::new(3, 120)),
        telemetry: telemetry.clone(),
    });

    let mut scheduler = JobSchedulerService::new(analysis.clone()).await?;
    scheduler.start().await?;

    let state = AppState {
        pool,
        config: config.clone(),
        analysis,
        telemetry,
    };
    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(&addr)
        .await
        .context("failed to bind listener")?;
    tracing::info!("🚀 MarketPulse backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
