mod asset;
mod dashboard;
mod sentiment;

pub use asset::{Asset, AssetCategory, AssetRow};
pub use dashboard::{
    ApiResponse, AssetWithSentiment, DashboardData, HistoricalSeries, HistoryPoint, SummaryMetrics,
    TopPick,
};
pub use sentiment::{
    NewSentimentRecord, Recommendation, RiskLevel, SentimentCases, SentimentMetadata,
    SentimentRecord, SentimentRow, SentimentStatus, SourceBreakdown, SourceReading,
};
