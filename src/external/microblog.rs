use async_trait::async_trait;
use serde::Deserialize;

use crate::external::sentiment_source::SentimentSource;
use crate::external::ProviderError;
use crate::models::{AssetCategory, SourceReading};

/// Trader-microblog sentiment from the StockTwits sentiment API.
pub struct MicroblogSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SentimentApiResponse {
    data: Option<SentimentDetail>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentDetail {
    sentiment: Option<MetricSet>,
    message_volume: Option<MetricSet>,
}

#[derive(Debug, Deserialize)]
struct MetricSet {
    now: Option<Metric>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metric {
    #[serde(default)]
    loaded: bool,
    value: Option<f64>,
    value_normalized: Option<f64>,
}

impl MicroblogSource {
    pub fn new() -> Self {
        Self::with_base_url("https://sentiment-v2-api.stocktwits.com")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into(),
        }
    }

    // Crypto symbols carry an .X suffix on the platform (BTC -> BTC.X).
    fn platform_symbol(ticker: &str, category: AssetCategory) -> String {
        let clean = ticker.trim_end_matches("-USD").to_uppercase();
        match category {
            AssetCategory::Crypto => format!("{clean}.X"),
            AssetCategory::Stock => clean,
        }
    }

    fn parse_detail(detail: &SentimentDetail) -> SourceReading {
        let mut score = 50;
        if let Some(metric) = detail.sentiment.as_ref().and_then(|s| s.now.as_ref()) {
            if metric.loaded {
                if let Some(normalized) = metric.value_normalized.filter(|v| *v >= 0.0) {
                    score = normalized.round() as i32;
                } else if let Some(value) = metric.value {
                    // Raw value is on a 0-1 scale.
                    score = (value * 100.0).round() as i32;
                }
            }
        }

        let mut volume = 0;
        if let Some(metric) = detail.message_volume.as_ref().and_then(|s| s.now.as_ref()) {
            if metric.loaded {
                if let Some(value) = metric.value {
                    volume = value.round() as i64;
                }
            }
        }

        SourceReading::new(score, volume)
    }
}

#[async_trait]
impl SentimentSource for MicroblogSource {
    fn name(&self) -> &'static str {
        "microblog"
    }

    async fn fetch_reading(
        &self,
        ticker: &str,
        category: AssetCategory,
    ) -> Result<SourceReading, ProviderError> {
        let symbol = Self::platform_symbol(ticker, category);
        let url = format!("{}/sentiment-api/{}/detail", self.base_url, symbol);

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "sentiment API returned {} for {}",
                resp.status(),
                ticker
            )));
        }

        let body: SentimentApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(ProviderError::BadResponse(error));
        }

        let detail = body
            .data
            .ok_or_else(|| ProviderError::BadResponse("no sentiment data returned".into()))?;

        Ok(Self::parse_detail(&detail))
    }
}
