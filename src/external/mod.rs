pub mod forum;
pub mod microblog;
pub mod newswire;
pub mod quote_provider;
pub mod sentiment_source;
pub mod yahoo;

use thiserror::Error;

/// Failure modes shared by every upstream HTTP collaborator.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}
