use async_trait::async_trait;
use serde::Deserialize;

use crate::external::quote_provider::{Quote, QuoteProvider};
use crate::external::ProviderError;
use crate::models::AssetCategory;

pub struct YahooQuoteProvider {
    client: reqwest::Client,
}

impl YahooQuoteProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    // Yahoo quotes crypto as pair symbols (BTC -> BTC-USD).
    fn yahoo_symbol(ticker: &str, category: AssetCategory) -> String {
        match category {
            AssetCategory::Crypto if !ticker.ends_with("-USD") => format!("{ticker}-USD"),
            _ => ticker.to_string(),
        }
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    regular_market_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
}

#[async_trait]
impl QuoteProvider for YahooQuoteProvider {
    async fn fetch_quote(
        &self,
        ticker: &str,
        category: AssetCategory,
    ) -> Result<Quote, ProviderError> {
        let symbol = Self::yahoo_symbol(ticker, category);
        let url = format!("https://query1.finance.yahoo.com/v8/finance/chart/{symbol}");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "Yahoo returned {} for {}",
                resp.status(),
                ticker
            )));
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let meta = body
            .chart
            .result
            .and_then(|mut r| r.pop())
            .map(|r| r.meta)
            .ok_or_else(|| ProviderError::BadResponse("missing chart result".into()))?;

        let price = meta
            .regular_market_price
            .ok_or_else(|| ProviderError::BadResponse("missing regularMarketPrice".into()))?;

        // previousClose is absent on some symbols; chartPreviousClose covers those.
        let previous_close = meta
            .previous_close
            .or(meta.chart_previous_close)
            .filter(|p| *p > 0.0)
            .unwrap_or(price);

        let change_24h = ((price - previous_close) / previous_close * 100.0 * 100.0).round() / 100.0;

        Ok(Quote {
            ticker: ticker.to_string(),
            price,
            change_24h,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_tickers_map_to_usd_pairs() {
        assert_eq!(
            YahooQuoteProvider::yahoo_symbol("BTC", AssetCategory::Crypto),
            "BTC-USD"
        );
        assert_eq!(
            YahooQuoteProvider::yahoo_symbol("ETH-USD", AssetCategory::Crypto),
            "ETH-USD"
        );
        assert_eq!(
            YahooQuoteProvider::yahoo_symbol("NVDA", AssetCategory::Stock),
            "NVDA"
        );
    }
}
