//! Structured event emitter for operational signals.
//!
//! Injected through `AppState`/`AnalysisContext` instead of living in a
//! process-wide buffer, so handlers and jobs stay testable and the sink can
//! be swapped without touching call sites.

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    Error,
    RateLimited,
    TimedOut,
}

impl FetchOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::Success => "success",
            FetchOutcome::Error => "error",
            FetchOutcome::RateLimited => "rate_limited",
            FetchOutcome::TimedOut => "timed_out",
        }
    }
}

#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    ApiCall {
        endpoint: &'static str,
        duration_ms: i64,
        status: u16,
    },
    SourceFetch {
        source: &'static str,
        ticker: String,
        outcome: FetchOutcome,
        duration_ms: i64,
    },
    AssetAnalyzed {
        ticker: String,
        score: i32,
        confidence: i32,
        duration_ms: i64,
    },
    JobRun {
        job: &'static str,
        success: bool,
        items_processed: i32,
        items_failed: i32,
        duration_ms: i64,
    },
}

pub trait Telemetry: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

/// Default sink: renders every event as a structured tracing record.
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn emit(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::ApiCall {
                endpoint,
                duration_ms,
                status,
            } => {
                if duration_ms > 3000 {
                    warn!(endpoint, duration_ms, status, "slow API call");
                } else {
                    info!(endpoint, duration_ms, status, "api call");
                }
            }
            TelemetryEvent::SourceFetch {
                source,
                ticker,
                outcome,
                duration_ms,
            } => {
                let outcome = outcome.as_str();
                if outcome == "success" {
                    info!(source, %ticker, outcome, duration_ms, "source fetch");
                } else {
                    warn!(source, %ticker, outcome, duration_ms, "source fetch degraded");
                }
            }
            TelemetryEvent::AssetAnalyzed {
                ticker,
                score,
                confidence,
                duration_ms,
            } => {
                info!(%ticker, score, confidence, duration_ms, "asset analyzed");
            }
            TelemetryEvent::JobRun {
                job,
                success,
                items_processed,
                items_failed,
                duration_ms,
            } => {
                info!(job, success, items_processed, items_failed, duration_ms, "job run");
            }
        }
    }
}
