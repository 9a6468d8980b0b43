use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::external::sentiment_source::SentimentSource;
use crate::external::ProviderError;
use crate::models::{AssetCategory, SourceReading};

/// News sentiment from an Alpha Vantage-compatible NEWS_SENTIMENT feed.
/// Article scores arrive on a [-1, 1] scale and are normalized to [0, 100].
pub struct NewswireSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct NewsFeedResponse {
    feed: Option<Vec<NewsArticle>>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsArticle {
    overall_sentiment_score: Option<f64>,
    overall_sentiment_label: Option<String>,
    ticker_sentiment: Option<Vec<TickerSentiment>>,
}

#[derive(Debug, Deserialize)]
struct TickerSentiment {
    ticker: String,
    ticker_sentiment_score: String,
    ticker_sentiment_label: String,
}

impl NewswireSource {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url("https://www.alphavantage.co", api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into(),
            api_key,
        }
    }

    // The feed addresses crypto as CRYPTO:BTC.
    fn feed_symbol(ticker: &str, category: AssetCategory) -> String {
        let clean = ticker.trim_end_matches("-USD");
        match category {
            AssetCategory::Crypto => format!("CRYPTO:{clean}"),
            AssetCategory::Stock => clean.to_string(),
        }
    }

    fn score_articles(articles: &[NewsArticle], symbol: &str) -> SourceReading {
        let mut total = 0.0;
        let mut valid = 0i64;

        for article in articles {
            // Prefer the ticker-specific score when the feed tagged this symbol.
            let ticker_specific = article.ticker_sentiment.as_ref().and_then(|list| {
                list.iter()
                    .find(|ts| ts.ticker.eq_ignore_ascii_case(symbol))
            });

            let score = match ticker_specific {
                Some(ts) => ts.ticker_sentiment_score.parse::<f64>().ok(),
                None => article.overall_sentiment_score,
            };

            if let Some(score) = score {
                total += score;
                valid += 1;
            }
        }

        if valid == 0 {
            return SourceReading::new(50, articles.len() as i64);
        }

        let avg = total / valid as f64;
        let normalized = (((avg + 1.0) / 2.0) * 100.0).round() as i32;

        SourceReading::new(normalized, valid)
    }
}

#[async_trait]
impl SentimentSource for NewswireSource {
    fn name(&self) -> &'static str {
        "news"
    }

    async fn fetch_reading(
        &self,
        ticker: &str,
        category: AssetCategory,
    ) -> Result<SourceReading, ProviderError> {
        let symbol = Self::feed_symbol(ticker, category);
        let url = format!(
            "{}/query?function=NEWS_SENTIMENT&tickers={}&limit=50&apikey={}",
            self.base_url, symbol, self.api_key
        );

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "news feed returned {} for {}",
                resp.status(),
                ticker
            )));
        }

        let body: NewsFeedResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        // Quota notes come back as 200s; treat them as an empty day, not an error.
        if let Some(message) = body.information.or(body.note) {
            warn!(%ticker, %message, "news feed quota message, reading neutral");
            return Ok(SourceReading::neutral());
        }

        let articles = body.feed.unwrap_or_default();
        if articles.is_empty() {
            return Ok(SourceReading::neutral());
        }

        Ok(Self::score_articles(&articles, &symbol))
    }
}
