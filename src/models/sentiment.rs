use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

/// Qualitative sentiment bucket. Thresholds are exact: score ≥ 70 is
/// bullish, 40–69 neutral, below 40 bearish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentStatus {
    Bullish,
    Neutral,
    Bearish,
}

impl SentimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentStatus::Bullish => "bullish",
            SentimentStatus::Neutral => "neutral",
            SentimentStatus::Bearish => "bearish",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "bullish" => SentimentStatus::Bullish,
            "bearish" => SentimentStatus::Bearish,
            _ => SentimentStatus::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
    Watch,
    Avoid,
}

/// One channel's raw signal for one asset on one day.
/// `trending_rank` only applies to the forum source (0 = not trending).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceReading {
    pub score: i32,
    pub volume: i64,
    pub trending_rank: i32,
}

impl SourceReading {
    pub fn new(score: i32, volume: i64) -> Self {
        Self {
            score: score.clamp(0, 100),
            volume: volume.max(0),
            trending_rank: 0,
        }
    }

    /// Fallback reading for an unreachable source: contributes zero weight.
    pub fn neutral() -> Self {
        Self {
            score: 50,
            volume: 0,
            trending_rank: 0,
        }
    }
}

/// Per-source breakdown persisted alongside each record, camelCase to match
/// the dashboard contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceBreakdown {
    pub forum_sentiment: i32,
    pub forum_mentions: i64,
    pub microblog_sentiment: i32,
    pub microblog_messages: i64,
    pub news_sentiment: i32,
    pub news_articles: i64,
    pub sources_analyzed: i32,
    pub mentions_count: i64,
}

impl SourceBreakdown {
    pub fn from_readings(forum: SourceReading, microblog: SourceReading, news: SourceReading) -> Self {
        Self {
            forum_sentiment: forum.score,
            forum_mentions: forum.volume,
            microblog_sentiment: microblog.score,
            microblog_messages: microblog.volume,
            news_sentiment: news.score,
            news_articles: news.volume,
            sources_analyzed: 3,
            mentions_count: forum.volume + microblog.volume + news.volume,
        }
    }

    pub fn total_volume(&self) -> i64 {
        self.forum_mentions + self.microblog_messages + self.news_articles
    }
}

impl Default for SourceBreakdown {
    fn default() -> Self {
        Self {
            forum_sentiment: 50,
            forum_mentions: 0,
            microblog_sentiment: 50,
            microblog_messages: 0,
            news_sentiment: 50,
            news_articles: 0,
            sources_analyzed: 0,
            mentions_count: 0,
        }
    }
}

/// Narrative cases produced by the case generator. Opaque strings as far as
/// this service is concerned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentimentCases {
    pub bullish: String,
    pub bearish: String,
    pub neutral: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentimentMetadata {
    pub volume_signal: String,
    pub momentum: String,
    pub key_factors: Vec<String>,
    pub sentiment_velocity: f64,
    pub signal_strength: i32,
    pub risk_level: RiskLevel,
    pub recommendation: Recommendation,
    /// False when the correlation is a cold-start placeholder rather than a
    /// coefficient computed from real history.
    pub correlation_computed: bool,
    /// Sentiment and price pulling in opposite directions.
    pub divergence: bool,
    pub sentiment_cases: SentimentCases,
}

impl Default for SentimentMetadata {
    fn default() -> Self {
        Self {
            volume_signal: "unknown".to_string(),
            momentum: "unknown".to_string(),
            key_factors: Vec::new(),
            sentiment_velocity: 0.0,
            signal_strength: 1,
            risk_level: RiskLevel::Medium,
            recommendation: Recommendation::Hold,
            correlation_computed: false,
            divergence: false,
            sentiment_cases: SentimentCases::default(),
        }
    }
}

/// One persisted analysis result per (ticker, analysis date).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentRecord {
    pub id: Uuid,
    pub ticker: String,
    pub analysis_date: NaiveDate,
    pub sentiment_score: i32,
    pub status: SentimentStatus,
    pub confidence: i32,
    pub price: f64,
    #[serde(rename = "change24h")]
    pub change_24h: f64,
    pub insight: String,
    pub correlation: f64,
    pub sources: SourceBreakdown,
    pub metadata: SentimentMetadata,
    pub created_at: DateTime<Utc>,
}

/// Input shape for the daily upsert; the row id is minted at write time.
#[derive(Debug, Clone)]
pub struct NewSentimentRecord {
    pub ticker: String,
    pub analysis_date: NaiveDate,
    pub sentiment_score: i32,
    pub status: SentimentStatus,
    pub confidence: i32,
    pub price: f64,
    pub change_24h: f64,
    pub insight: String,
    pub correlation: f64,
    pub sources: SourceBreakdown,
    pub metadata: SentimentMetadata,
}

// Raw database shape with the JSONB blobs undecoded.
#[derive(Debug, Clone, FromRow)]
pub struct SentimentRow {
    pub id: Uuid,
    pub ticker: String,
    pub analysis_date: NaiveDate,
    pub sentiment_score: i32,
    pub status: String,
    pub confidence: i32,
    pub price: f64,
    pub change_24h: f64,
    pub insight: String,
    pub correlation: f64,
    pub sources: serde_json::Value,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl SentimentRow {
    /// Decode the stored blobs, falling back to all-neutral defaults when a
    /// blob fails to parse. A malformed row degrades, it never errors.
    pub fn into_record(self) -> SentimentRecord {
        let sources = serde_json::from_value(self.sources).unwrap_or_else(|e| {
            warn!(ticker = %self.ticker, error = %e, "malformed sources blob, using neutral defaults");
            SourceBreakdown::default()
        });
        let metadata = serde_json::from_value(self.metadata).unwrap_or_else(|e| {
            warn!(ticker = %self.ticker, error = %e, "malformed metadata blob, using neutral defaults");
            SentimentMetadata::default()
        });

        SentimentRecord {
            id: self.id,
            ticker: self.ticker,
            analysis_date: self.analysis_date,
            sentiment_score: self.sentiment_score,
            status: SentimentStatus::parse(&self.status),
            confidence: self.confidence,
            price: self.price,
            change_24h: self.change_24h,
            insight: self.insight,
            correlation: self.correlation,
            sources,
            metadata,
            created_at: self.created_at,
        }
    }
}
