use async_trait::async_trait;
use regex::Regex;

use crate::external::sentiment_source::SentimentSource;
use crate::external::ProviderError;
use crate::models::{AssetCategory, SourceReading};

/// Retail-forum sentiment scraped from an ApeWisdom-style tracker page.
/// The tracker has no JSON API, so the score, mention count and trending
/// rank are pulled out of the HTML with a small set of patterns.
pub struct ForumSource {
    client: reqwest::Client,
    base_url: String,
    sentiment_patterns: Vec<Regex>,
    mention_patterns: Vec<Regex>,
    rank_pattern: Regex,
}

impl ForumSource {
    pub fn new() -> Self {
        Self::with_base_url("https://apewisdom.io")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let sentiment_patterns = [
            r#"(?i)<div class="tile-value"[^>]*>(\d+)%"#,
            r"(?is)sentiment.*?(\d+)%",
            r"(?is)(\d+)%.*?sentiment",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid forum sentiment pattern"))
        .collect();

        let mention_patterns = [
            r"(?i)(\d+)\s*(?:mentions|comments|posts)",
            r#"(?i)<div class="tile-value"[^>]*>(\d+)\s*<span"#,
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid forum mention pattern"))
        .collect();

        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into(),
            sentiment_patterns,
            mention_patterns,
            rank_pattern: Regex::new(r"(?is)rank.*?#?(\d+)").expect("invalid forum rank pattern"),
        }
    }

    fn page_url(&self, ticker: &str, category: AssetCategory) -> String {
        let clean = ticker.trim_end_matches("-USD");
        let section = match category {
            AssetCategory::Crypto => "cryptocurrencies",
            AssetCategory::Stock => "stocks",
        };
        format!("{}/{}/{}/", self.base_url, section, clean)
    }

    fn parse_page(&self, html: &str) -> SourceReading {
        let mut score = 50;
        for pattern in &self.sentiment_patterns {
            if let Some(value) = first_capture(pattern, html) {
                if (0..=100).contains(&value) {
                    score = value as i32;
                    break;
                }
            }
        }

        let mut mentions = 0;
        for pattern in &self.mention_patterns {
            if let Some(value) = first_capture(pattern, html) {
                mentions = value;
                break;
            }
        }

        let rank = first_capture(&self.rank_pattern, html).unwrap_or(0) as i32;

        let mut reading = SourceReading::new(score, mentions);
        reading.trending_rank = rank;
        reading
    }
}

fn first_capture(pattern: &Regex, html: &str) -> Option<i64> {
    pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[async_trait]
impl SentimentSource for ForumSource {
    fn name(&self) -> &'static str {
        "forum"
    }

    async fn fetch_reading(
        &self,
        ticker: &str,
        category: AssetCategory,
    ) -> Result<SourceReading, ProviderError> {
        let url = self.page_url(ticker, category);

        let resp = self
            .client
            .get(&url)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "forum tracker returned {} for {}",
                resp.status(),
                ticker
            )));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(self.parse_page(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tile_values_and_rank() {
        let source = ForumSource::new();
        let html = r#"
            <div class="tile"><div class="tile-value">73%</div>sentiment</div>
            <div class="tile"><div class="tile-value">412 <span>mentions</span></div></div>
            <div class="tile">rank #4</div>
        "#;
        let reading = source.parse_page(html);

        assert_eq!(reading.score, 73);
        assert_eq!(reading.volume, 412);
        assert_eq!(reading.trending_rank, 4);
    }

    #[test]
    fn unparseable_page_degrades_to_neutral() {
        let source = ForumSource::new();
        let reading = source.parse_page("<html><body>nothing useful</body></html>");

        assert_eq!(reading.score, 50);
        assert_eq!(reading.volume, 0);
        assert_eq!(reading.trending_rank, 0);
    }

    #[test]
    fn crypto_pages_live_under_cryptocurrencies() {
        let source = ForumSource::with_base_url("https://example.test");
        assert_eq!(
            source.page_url("BTC-USD", AssetCategory::Crypto),
            "https://example.test/cryptocurrencies/BTC/"
        );
        assert_eq!(
            source.page_url("NVDA", AssetCategory::Stock),
            "https://example.test/stocks/NVDA/"
        );
    }
}
