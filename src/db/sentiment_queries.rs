use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::models::{NewSentimentRecord, SentimentRow};

// Runtime-checked queries throughout: the JSONB blobs and DISTINCT ON make
// the macro form awkward here, and the row shapes are covered by FromRow.

const SELECT_COLUMNS: &str = "id, ticker, analysis_date, sentiment_score, status, confidence, \
     price, change_24h, insight, correlation, sources, metadata, created_at";

/// Upsert the daily record, keyed on (ticker, analysis_date). Safe to re-run:
/// a second write for the same day replaces the first.
pub async fn upsert(pool: &PgPool, record: &NewSentimentRecord) -> Result<(), sqlx::Error> {
    let sources = serde_json::to_value(&record.sources).unwrap_or_default();
    let metadata = serde_json::to_value(&record.metadata).unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO sentiment_records (
            id, ticker, analysis_date, sentiment_score, status, confidence,
            price, change_24h, insight, correlation, sources, metadata
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (ticker, analysis_date)
        DO UPDATE SET
            sentiment_score = EXCLUDED.sentiment_score,
            status = EXCLUDED.status,
            confidence = EXCLUDED.confidence,
            price = EXCLUDED.price,
            change_24h = EXCLUDED.change_24h,
            insight = EXCLUDED.insight,
            correlation = EXCLUDED.correlation,
            sources = EXCLUDED.sources,
            metadata = EXCLUDED.metadata
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&record.ticker)
    .bind(record.analysis_date)
    .bind(record.sentiment_score)
    .bind(record.status.as_str())
    .bind(record.confidence)
    .bind(record.price)
    .bind(record.change_24h)
    .bind(&record.insight)
    .bind(record.correlation)
    .bind(sources)
    .bind(metadata)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(ticker = %record.ticker, date = %record.analysis_date, "failed to upsert sentiment record: {}", e);
        e
    })?;

    Ok(())
}

/// Latest record per ticker in one query (DISTINCT ON keeps only the newest
/// analysis_date per ticker).
pub async fn fetch_latest_per_ticker(pool: &PgPool) -> Result<Vec<SentimentRow>, sqlx::Error> {
    sqlx::query_as::<_, SentimentRow>(&format!(
        r#"
        SELECT DISTINCT ON (ticker) {SELECT_COLUMNS}
        FROM sentiment_records
        ORDER BY ticker, analysis_date DESC
        "#
    ))
    .fetch_all(pool)
    .await
}

/// Records for one ticker within the last `days` days, oldest first.
pub async fn fetch_window(
    pool: &PgPool,
    ticker: &str,
    since: NaiveDate,
) -> Result<Vec<SentimentRow>, sqlx::Error> {
    sqlx::query_as::<_, SentimentRow>(&format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM sentiment_records
        WHERE ticker = $1
          AND analysis_date >= $2
        ORDER BY analysis_date ASC
        "#
    ))
    .bind(ticker)
    .bind(since)
    .fetch_all(pool)
    .await
}

/// Trailing history strictly before `before`, oldest first. Feeds velocity
/// and correlation; a same-day re-run never sees its own output.
pub async fn fetch_history_before(
    pool: &PgPool,
    ticker: &str,
    before: NaiveDate,
    since: NaiveDate,
) -> Result<Vec<SentimentRow>, sqlx::Error> {
    sqlx::query_as::<_, SentimentRow>(&format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM sentiment_records
        WHERE ticker = $1
          AND analysis_date < $2
          AND analysis_date >= $3
        ORDER BY analysis_date ASC
        "#
    ))
    .bind(ticker)
    .bind(before)
    .bind(since)
    .fetch_all(pool)
    .await
}
