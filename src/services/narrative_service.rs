//! Narrative text for each record: the one-line insight and the
//! bull/bear/neutral cases.
//!
//! Case generation is an external collaborator behind `CaseGenerator`; its
//! output is consumed as opaque strings. When the collaborator is disabled
//! or failing, static templates keep the dashboard populated.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::{Asset, SentimentCases, SentimentStatus, SourceBreakdown};

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("case generation is disabled")]
    Disabled,

    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait CaseGenerator: Send + Sync {
    async fn generate_cases(
        &self,
        asset: &Asset,
        sources: &SourceBreakdown,
    ) -> Result<SentimentCases, NarrativeError>;
}

/// No-key deployment: every call reports disabled so callers fall back.
pub struct DisabledCaseGenerator;

#[async_trait]
impl CaseGenerator for DisabledCaseGenerator {
    async fn generate_cases(
        &self,
        _asset: &Asset,
        _sources: &SourceBreakdown,
    ) -> Result<SentimentCases, NarrativeError> {
        Err(NarrativeError::Disabled)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CasesEnvelope {
    sentiment_cases: SentimentCases,
}

/// xAI chat-completions backed generator.
pub struct XaiCaseGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl XaiCaseGenerator {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            model: "grok-3-mini".to_string(),
        }
    }

    fn build_prompt(asset: &Asset, sources: &SourceBreakdown) -> String {
        format!(
            r#"You are a financial analyst. Analyze {name} ({ticker}) and provide detailed sentiment cases in this exact JSON structure:

{{
  "sentiment_cases": {{
    "bullish": "<Detailed bullish case: fundamentals, positive industry trends, technical breakouts, upcoming catalysts.>",
    "bearish": "<Detailed bearish case: fundamental concerns, industry headwinds, technical breakdown, upcoming risks.>",
    "neutral": "<Balanced case: mixed signals, range-bound patterns, key levels to monitor.>"
  }}
}}

Social data context: {forum_mentions} forum mentions ({forum_sentiment}%), {microblog_messages} microblog messages ({microblog_sentiment}%), {news_articles} news articles ({news_sentiment}%).

IMPORTANT: Keep sentiment_cases concise but detailed with specific fundamental insights."#,
            name = asset.name,
            ticker = asset.ticker,
            forum_mentions = sources.forum_mentions,
            forum_sentiment = sources.forum_sentiment,
            microblog_messages = sources.microblog_messages,
            microblog_sentiment = sources.microblog_sentiment,
            news_articles = sources.news_articles,
            news_sentiment = sources.news_sentiment,
        )
    }

    async fn call_with_retry(&self, request: &ChatRequest) -> Result<ChatResponse, NarrativeError> {
        let mut retry_count = 0;
        let max_retries = 3;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.call(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    retry_count += 1;
                    if retry_count >= max_retries {
                        error!("case generation failed after {} retries: {}", max_retries, e);
                        return Err(e);
                    }

                    warn!(
                        "case generation failed (attempt {}/{}): {}. Retrying in {:?}...",
                        retry_count, max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    async fn call(&self, request: &ChatRequest) -> Result<ChatResponse, NarrativeError> {
        let response = self
            .client
            .post("https://api.x.ai/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| NarrativeError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NarrativeError::BadResponse(format!(
                "chat API returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| NarrativeError::Parse(e.to_string()))
    }

    fn parse_cases(content: &str) -> Result<SentimentCases, NarrativeError> {
        // Models wrap JSON in markdown fences more often than not.
        let clean = content
            .replace("```json", "")
            .replace("```", "")
            .trim()
            .to_string();

        let envelope: CasesEnvelope =
            serde_json::from_str(&clean).map_err(|e| NarrativeError::Parse(e.to_string()))?;

        Ok(envelope.sentiment_cases)
    }
}

#[async_trait]
impl CaseGenerator for XaiCaseGenerator {
    async fn generate_cases(
        &self,
        asset: &Asset,
        sources: &SourceBreakdown,
    ) -> Result<SentimentCases, NarrativeError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::build_prompt(asset, sources),
            }],
            temperature: 0.3,
            max_tokens: 1500,
        };

        let response = self.call_with_retry(&request).await?;
        let content = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| NarrativeError::BadResponse("empty choices".into()))?;

        Self::parse_cases(content)
    }
}

/// Static templates used whenever the collaborator cannot answer.
pub fn fallback_cases(name: &str, total_mentions: i64) -> SentimentCases {
    SentimentCases {
        bullish: format!(
            "Bullish case for {name}: Positive social sentiment with {total_mentions} total mentions. \
             Key factors include strong community engagement and positive news flow. \
             Watch for continued momentum and technical breakouts."
        ),
        bearish: format!(
            "Bearish case for {name}: Market volatility and mixed signals may pressure the asset. \
             Consider profit-taking levels and potential resistance areas. \
             Monitor for any negative developments."
        ),
        neutral: format!(
            "Neutral case for {name}: Balanced sentiment across sources suggests consolidation. \
             Watch for clear directional catalysts or volume breakouts to confirm the next move."
        ),
    }
}

/// Cases from the collaborator, or the static templates when it is disabled
/// or fails. Never errors.
pub async fn cases_or_fallback(
    generator: &dyn CaseGenerator,
    asset: &Asset,
    sources: &SourceBreakdown,
) -> SentimentCases {
    match generator.generate_cases(asset, sources).await {
        Ok(cases) => cases,
        Err(NarrativeError::Disabled) => fallback_cases(&asset.name, sources.total_volume()),
        Err(e) => {
            info!(ticker = %asset.ticker, "case generator unavailable ({}), using fallback cases", e);
            fallback_cases(&asset.name, sources.total_volume())
        }
    }
}

/// One-line insight summarizing the blend for the dashboard row.
pub fn build_insight(status: SentimentStatus, name: &str, sources: &SourceBreakdown) -> String {
    let detail = format!(
        "Forum: {} mentions ({}%), Microblog: {} messages ({}%), News: {} articles ({}%)",
        sources.forum_mentions,
        sources.forum_sentiment,
        sources.microblog_messages,
        sources.microblog_sentiment,
        sources.news_articles,
        sources.news_sentiment,
    );

    match status {
        SentimentStatus::Bullish => format!(
            "Strong positive sentiment across all sources. {detail}. Overall market sentiment is optimistic about {name}."
        ),
        SentimentStatus::Bearish => format!(
            "Negative sentiment detected across sources. {detail}. Market sentiment is cautious or pessimistic about {name}."
        ),
        SentimentStatus::Neutral => format!(
            "Mixed sentiment across sources. {detail}. Market opinion appears divided on {name}."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetCategory;

    fn asset() -> Asset {
        Asset {
            ticker: "NVDA".to_string(),
            name: "NVIDIA".to_string(),
            category: AssetCategory::Stock,
            color: "#76B900".to_string(),
        }
    }

    #[test]
    fn prompt_includes_social_context() {
        let sources = SourceBreakdown {
            forum_mentions: 12,
            forum_sentiment: 64,
            ..SourceBreakdown::default()
        };
        let prompt = XaiCaseGenerator::build_prompt(&asset(), &sources);

        assert!(prompt.contains("NVIDIA (NVDA)"));
        assert!(prompt.contains("12 forum mentions (64%)"));
        assert!(prompt.contains("sentiment_cases"));
    }

    #[test]
    fn parses_fenced_json_cases() {
        let content = r#"```json
{"sentiment_cases": {"bullish": "b", "bearish": "r", "neutral": "n"}}
```"#;
        let cases = XaiCaseGenerator::parse_cases(content).unwrap();
        assert_eq!(cases.bullish, "b");
        assert_eq!(cases.neutral, "n");
    }

    #[test]
    fn garbage_content_is_a_parse_error() {
        assert!(matches!(
            XaiCaseGenerator::parse_cases("not json at all"),
            Err(NarrativeError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn disabled_generator_falls_back_to_templates() {
        let sources = SourceBreakdown::default();
        let cases = cases_or_fallback(&DisabledCaseGenerator, &asset(), &sources).await;

        assert!(cases.bullish.contains("NVIDIA"));
        assert!(cases.bearish.contains("NVIDIA"));
        assert!(cases.neutral.contains("NVIDIA"));
    }

    #[test]
    fn insight_varies_by_status() {
        let sources = SourceBreakdown::default();
        let bullish = build_insight(SentimentStatus::Bullish, "Apple", &sources);
        let bearish = build_insight(SentimentStatus::Bearish, "Apple", &sources);
        let neutral = build_insight(SentimentStatus::Neutral, "Apple", &sources);

        assert!(bullish.contains("optimistic about Apple"));
        assert!(bearish.contains("cautious or pessimistic"));
        assert!(neutral.contains("divided on Apple"));
        for text in [&bullish, &bearish, &neutral] {
            assert!(text.contains("Forum: 0 mentions (50%)"));
        }
    }
}
