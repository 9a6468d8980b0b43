//! Per-asset analysis pipeline and the daily batch fan-out.
//!
//! Every asset is an independent unit of work: three source readings plus a
//! quote feed the aggregator, the trailing history feeds the correlation
//! engine, and the result is upserted keyed on (ticker, analysis_date).
//! Failures degrade per the taxonomy: a dead source reads neutral, a dead
//! asset still gets a neutral record and a failure entry in the summary.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use sqlx::PgPool;
use tokio::time::{timeout, Instant};
use tracing::{error, info, warn};

use crate::db::{asset_queries, sentiment_queries};
use crate::errors::AppError;
use crate::external::quote_provider::{Quote, QuoteProvider};
use crate::external::sentiment_source::SentimentSource;
use crate::external::ProviderError;
use crate::models::{
    Asset, NewSentimentRecord, SentimentMetadata, SentimentStatus, SourceBreakdown, SourceReading,
};
use crate::services::correlation::SeriesPoint;
use crate::services::narrative_service::{self, CaseGenerator};
use crate::services::rate_limiter::RateLimiter;
use crate::services::{aggregator, correlation};
use crate::telemetry::{FetchOutcome, Telemetry, TelemetryEvent};

/// A hung upstream call must not stall the batch; past this it reads neutral.
const SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Trailing window fed to velocity and correlation.
const HISTORY_WINDOW_DAYS: i64 = 30;

/// Everything the pipeline needs, shared by the HTTP trigger and the
/// scheduler. All collaborators sit behind traits so tests can stub them.
pub struct AnalysisContext {
    pub pool: PgPool,
    pub quotes: Arc<dyn QuoteProvider>,
    pub forum: Arc<dyn SentimentSource>,
    pub microblog: Arc<dyn SentimentSource>,
    pub news: Arc<dyn SentimentSource>,
    pub cases: Arc<dyn CaseGenerator>,
    pub rate_limiter: Arc<RateLimiter>,
    pub telemetry: Arc<dyn Telemetry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOutcome {
    pub ticker: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SentimentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchSummary {
    pub total: i32,
    pub successful: i32,
    pub failed: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub message: String,
    pub results: Vec<AssetOutcome>,
    pub summary: BatchSummary,
}

/// Run the full pipeline for every known asset, concurrently. One asset's
/// failure never blocks the rest.
pub async fn run_batch(ctx: &AnalysisContext) -> Result<BatchReport, AppError> {
    let assets = asset_queries::fetch_all(&ctx.pool).await?;
    let analysis_date = Utc::now().date_naive();

    info!("Starting daily sentiment analysis for {} assets", assets.len());

    let results = join_all(
        assets
            .iter()
            .map(|asset| analyze_asset(ctx, asset, analysis_date)),
    )
    .await;

    let successful = results.iter().filter(|r| r.success).count() as i32;
    let total = assets.len() as i32;

    info!("Daily analysis completed: {}/{} successful", successful, total);

    Ok(BatchReport {
        message: "Daily analysis completed".to_string(),
        results,
        summary: BatchSummary {
            total,
            successful,
            failed: total - successful,
        },
    })
}

async fn analyze_asset(ctx: &AnalysisContext, asset: &Asset, analysis_date: NaiveDate) -> AssetOutcome {
    let started = Instant::now();

    match build_record(ctx, asset, analysis_date).await {
        Ok(record) => {
            if let Err(e) = sentiment_queries::upsert(&ctx.pool, &record).await {
                error!(ticker = %asset.ticker, "failed to persist record: {}", e);
                return AssetOutcome {
                    ticker: asset.ticker.clone(),
                    success: false,
                    sentiment_score: None,
                    status: None,
                    error: Some("failed to persist record".to_string()),
                };
            }

            ctx.telemetry.emit(TelemetryEvent::AssetAnalyzed {
                ticker: asset.ticker.clone(),
                score: record.sentiment_score,
                confidence: record.confidence,
                duration_ms: started.elapsed().as_millis() as i64,
            });

            info!(
                "✓ {}: sentiment {}, price ${:.2}, change {:.2}%",
                asset.ticker, record.sentiment_score, record.price, record.change_24h
            );

            AssetOutcome {
                ticker: asset.ticker.clone(),
                success: true,
                sentiment_score: Some(record.sentiment_score),
                status: Some(record.status),
                error: None,
            }
        }
        Err(e) => {
            error!(ticker = %asset.ticker, "analysis failed: {}", e);

            // The dashboard still needs a row for today: degrade to a fully
            // neutral record, then report the asset as failed.
            let fallback = neutral_record(asset, analysis_date);
            if let Err(e) = sentiment_queries::upsert(&ctx.pool, &fallback).await {
                error!(ticker = %asset.ticker, "failed to persist neutral fallback: {}", e);
            }

            AssetOutcome {
                ticker: asset.ticker.clone(),
                success: false,
                sentiment_score: None,
                status: None,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn build_record(
    ctx: &AnalysisContext,
    asset: &Asset,
    analysis_date: NaiveDate,
) -> Result<NewSentimentRecord, AppError> {
    // The three channels are independent; fetch them together.
    let (forum, microblog, news) = tokio::join!(
        fetch_reading_guarded(ctx, ctx.forum.as_ref(), asset),
        fetch_reading_guarded(ctx, ctx.microblog.as_ref(), asset),
        fetch_reading_guarded(ctx, ctx.news.as_ref(), asset),
    );

    let quote = fetch_quote_guarded(ctx, asset).await;

    let since = analysis_date - chrono::Duration::days(HISTORY_WINDOW_DAYS);
    let history = sentiment_queries::fetch_history_before(
        &ctx.pool,
        &asset.ticker,
        analysis_date,
        since,
    )
    .await?;

    let sources = SourceBreakdown::from_readings(forum, microblog, news);
    let score = aggregator::composite_score(&sources);
    let status = aggregator::status_for(score);
    let confidence = aggregator::confidence_for(sources.total_volume());

    let yesterday = history.last().map(|row| row.sentiment_score);
    let velocity = aggregator::velocity(score, yesterday);

    let history_points: Vec<SeriesPoint> = history
        .iter()
        .map(|row| SeriesPoint {
            sentiment: row.sentiment_score as f64,
            price: row.price,
        })
        .collect();
    let today_point = SeriesPoint {
        sentiment: score as f64,
        price: quote.price,
    };
    let correlation = correlation::correlation_signal(&history_points, today_point);

    let divergence = {
        let mut points = history_points.clone();
        points.push(today_point);
        correlation::detect_divergence(&points, correlation::DIVERGENCE_THRESHOLD)
    };

    let signal_strength = aggregator::signal_strength(score, confidence, correlation.value);
    let risk = aggregator::risk_level(asset.category, quote.change_24h);
    let recommendation = aggregator::recommend(score, velocity, risk);

    let cases = narrative_service::cases_or_fallback(ctx.cases.as_ref(), asset, &sources).await;
    let insight = narrative_service::build_insight(status, &asset.name, &sources);

    let key_factors = vec![
        format!("Combined sentiment: {}", status.as_str()),
        format!("Forum: {} mentions ({}%)", sources.forum_mentions, sources.forum_sentiment),
        format!(
            "Microblog: {} messages ({}%)",
            sources.microblog_messages, sources.microblog_sentiment
        ),
        format!("News: {} articles ({}%)", sources.news_articles, sources.news_sentiment),
        if forum.trending_rank > 0 {
            format!("Forum trending rank: #{}", forum.trending_rank)
        } else {
            "Not trending on forums".to_string()
        },
    ];

    let metadata = SentimentMetadata {
        volume_signal: aggregator::volume_signal(forum.trending_rank).to_string(),
        momentum: aggregator::momentum_descriptor(status, confidence).to_string(),
        key_factors,
        sentiment_velocity: velocity,
        signal_strength,
        risk_level: risk,
        recommendation,
        correlation_computed: correlation.computed,
        divergence,
        sentiment_cases: cases,
    };

    Ok(NewSentimentRecord {
        ticker: asset.ticker.clone(),
        analysis_date,
        sentiment_score: score,
        status,
        confidence,
        price: quote.price,
        change_24h: quote.change_24h,
        insight,
        correlation: correlation.value,
        sources,
        metadata,
    })
}

/// One throttled, time-boxed source fetch. Anything short of a reading
/// degrades to neutral.
async fn fetch_reading_guarded(
    ctx: &AnalysisContext,
    source: &dyn SentimentSource,
    asset: &Asset,
) -> SourceReading {
    let _guard = ctx.rate_limiter.acquire().await;
    let started = Instant::now();

    let (reading, outcome) = match timeout(
        SOURCE_TIMEOUT,
        source.fetch_reading(&asset.ticker, asset.category),
    )
    .await
    {
        Ok(Ok(reading)) => (reading, FetchOutcome::Success),
        Ok(Err(ProviderError::RateLimited)) => {
            warn!(source = source.name(), ticker = %asset.ticker, "source rate limited, reading neutral");
            (SourceReading::neutral(), FetchOutcome::RateLimited)
        }
        Ok(Err(e)) => {
            warn!(source = source.name(), ticker = %asset.ticker, "source fetch failed ({}), reading neutral", e);
            (SourceReading::neutral(), FetchOutcome::Error)
        }
        Err(_) => {
            warn!(source = source.name(), ticker = %asset.ticker, "source fetch timed out, reading neutral");
            (SourceReading::neutral(), FetchOutcome::TimedOut)
        }
    };

    ctx.telemetry.emit(TelemetryEvent::SourceFetch {
        source: source.name(),
        ticker: asset.ticker.clone(),
        outcome,
        duration_ms: started.elapsed().as_millis() as i64,
    });

    reading
}

async fn fetch_quote_guarded(ctx: &AnalysisContext, asset: &Asset) -> Quote {
    let _guard = ctx.rate_limiter.acquire().await;

    match timeout(SOURCE_TIMEOUT, ctx.quotes.fetch_quote(&asset.ticker, asset.category)).await {
        Ok(Ok(quote)) => quote,
        Ok(Err(e)) => {
            warn!(ticker = %asset.ticker, "no price data available ({}), using fallback", e);
            Quote {
                ticker: asset.ticker.clone(),
                price: 0.0,
                change_24h: 0.0,
            }
        }
        Err(_) => {
            warn!(ticker = %asset.ticker, "quote fetch timed out, using fallback");
            Quote {
                ticker: asset.ticker.clone(),
                price: 0.0,
                change_24h: 0.0,
            }
        }
    }
}

/// Record written when the whole pipeline failed for an asset.
fn neutral_record(asset: &Asset, analysis_date: NaiveDate) -> NewSentimentRecord {
    let sources = SourceBreakdown::default();

    let metadata = SentimentMetadata {
        volume_signal: "normal".to_string(),
        momentum: "steady".to_string(),
        key_factors: vec!["Analysis unavailable".to_string()],
        sentiment_cases: narrative_service::fallback_cases(&asset.name, 0),
        ..SentimentMetadata::default()
    };

    NewSentimentRecord {
        ticker: asset.ticker.clone(),
        analysis_date,
        sentiment_score: 50,
        status: SentimentStatus::Neutral,
        confidence: 50,
        price: 0.0,
        change_24h: 0.0,
        insight: "Unable to perform detailed analysis at this time. Market conditions appear neutral."
            .to_string(),
        correlation: 0.0,
        sources,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetCategory, Recommendation, RiskLevel};

    fn asset() -> Asset {
        Asset {
            ticker: "AMD".to_string(),
            name: "AMD".to_string(),
            category: AssetCategory::Stock,
            color: "#ED1C24".to_string(),
        }
    }

    #[test]
    fn neutral_record_is_fully_neutral() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 7).unwrap();
        let record = neutral_record(&asset(), date);

        assert_eq!(record.sentiment_score, 50);
        assert_eq!(record.status, SentimentStatus::Neutral);
        assert_eq!(record.confidence, 50);
        assert_eq!(record.correlation, 0.0);
        assert_eq!(record.metadata.recommendation, Recommendation::Hold);
        assert_eq!(record.metadata.risk_level, RiskLevel::Medium);
        assert!(!record.metadata.correlation_computed);
        assert!(record.metadata.sentiment_cases.bullish.contains("AMD"));
    }
}
