use async_trait::async_trait;

use crate::external::ProviderError;
use crate::models::{AssetCategory, SourceReading};

/// One sentiment channel (forum, microblog, news). Implementations return
/// a raw score/volume reading per asset per run; callers degrade failures
/// to `SourceReading::neutral()` so a dead channel never aborts a batch.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_reading(
        &self,
        ticker: &str,
        category: AssetCategory,
    ) -> Result<SourceReading, ProviderError>;
}
