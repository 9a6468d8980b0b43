use async_trait::async_trait;

use crate::external::ProviderError;
use crate::models::AssetCategory;

/// Spot quote for one asset: latest price plus 24h change percentage.
#[derive(Debug, Clone)]
pub struct Quote {
    pub ticker: String,
    pub price: f64,
    pub change_24h: f64,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(
        &self,
        ticker: &str,
        category: AssetCategory,
    ) -> Result<Quote, ProviderError>;
}
