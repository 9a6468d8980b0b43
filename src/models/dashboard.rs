use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Asset, SentimentRecord, SentimentStatus};

/// Uniform success envelope for every read endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Asset joined with its most recent record, if one exists yet.
#[derive(Debug, Clone, Serialize)]
pub struct AssetWithSentiment {
    #[serde(flatten)]
    pub asset: Asset,
    pub sentiment: Option<SentimentRecord>,
}

/// Top-pick entry surfaced on the dashboard (top 3 bullish by score).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopPick {
    pub ticker: String,
    pub name: String,
    pub score: i32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub avg_sentiment: i32,
    pub bullish_count: i32,
    pub total_assets: i32,
    #[serde(rename = "avgChange24h")]
    pub avg_change_24h: f64,
    pub total_sources: i64,
    pub accuracy_rate: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub assets: Vec<AssetWithSentiment>,
    pub recommendations: Vec<TopPick>,
    pub summary: SummaryMetrics,
    pub last_updated: DateTime<Utc>,
}

/// One point in a per-ticker history window. Days before sentiment coverage
/// began carry a price-only placeholder with the sentiment fields null.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub sentiment: Option<i32>,
    pub price: f64,
    pub correlation: Option<f64>,
    pub confidence: Option<i32>,
    pub status: Option<SentimentStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoricalSeries {
    pub ticker: String,
    pub days: i64,
    pub data: Vec<HistoryPoint>,
}
