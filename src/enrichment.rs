//! Article summaries and the digest intro, produced by a text generator with
//! a deterministic fallback whenever generation is unavailable or fails.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::article::{truncate_chars, Article};
use crate::config::{Config, EnrichmentConfig};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation is not configured")]
    Unavailable,
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generation service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("generation service returned no text")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Something that turns a prompt into a single block of text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Stand-in used when no API key is configured. Every call reports
/// `Unavailable` so the summarizer takes its fallback path.
#[derive(Debug, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable)
    }
}

/// Anthropic Messages API client.
pub struct AnthropicGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for AnthropicGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicGenerator")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicGenerator {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GenerationError::Client)?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status { status, body });
        }

        let parsed: MessagesResponse = response.json().await?;
        let text = parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(text)
    }
}

/// Produces per-article summaries and the digest intro.
pub struct Summarizer {
    generator: Box<dyn TextGenerator>,
    settings: EnrichmentConfig,
    max_summary_length: usize,
}

impl Summarizer {
    pub fn new(
        generator: Box<dyn TextGenerator>,
        settings: EnrichmentConfig,
        max_summary_length: usize,
    ) -> Self {
        Self {
            generator,
            settings,
            max_summary_length,
        }
    }

    /// Use the Anthropic API when a key is present, the disabled generator
    /// otherwise.
    pub fn from_config(config: &Config, api_key: Option<String>) -> Result<Self, GenerationError> {
        let generator: Box<dyn TextGenerator> = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                info!("Using Anthropic (model: {})", config.enrichment.model);
                Box::new(AnthropicGenerator::new(
                    key,
                    config.enrichment.model.clone(),
                    config.enrichment.base_url.clone(),
                    Duration::from_secs(config.request_timeout_secs),
                )?)
            }
            None => {
                warn!("ANTHROPIC_API_KEY not found. Summarization will be disabled.");
                Box::new(DisabledGenerator)
            }
        };

        Ok(Self::new(
            generator,
            config.enrichment.clone(),
            config.max_summary_length,
        ))
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn summary_prompt(&self, article: &Article) -> String {
        format!(
            "Summarize this AI/tech news article in 1-2 sentences (max {} characters):\n\n\
             Title: {}\n\
             Content: {}\n\n\
             Focus on the key AI/tech developments and their significance.",
            self.max_summary_length, article.title, article.summary
        )
    }

    pub fn intro_prompt(article_count: usize) -> String {
        format!(
            "Write a brief, engaging introduction for a daily AI/tech newsletter \
             with {} articles.\n\
             Keep it under 50 words and make it sound professional but friendly.",
            article_count
        )
    }

    /// Short summary bounded to the configured length. Falls back to the
    /// article's own summary, truncated.
    pub async fn summarize(&self, article: &Article) -> String {
        let request = GenerationRequest {
            prompt: self.summary_prompt(article),
            max_tokens: self.settings.summary_max_tokens,
            temperature: self.settings.summary_temperature,
        };

        match self.generator.generate(&request).await {
            Ok(text) => truncate_chars(&text, self.max_summary_length),
            Err(e) => {
                log_fallback("summarizing article", &e);
                truncate_chars(&article.summary, self.max_summary_length)
            }
        }
    }

    pub async fn generate_intro(&self, article_count: usize) -> String {
        let request = GenerationRequest {
            prompt: Self::intro_prompt(article_count),
            max_tokens: self.settings.intro_max_tokens,
            temperature: self.settings.intro_temperature,
        };

        match self.generator.generate(&request).await {
            Ok(text) => text,
            Err(GenerationError::Unavailable) => {
                format!("Here are the latest {} AI and tech news articles:", article_count)
            }
            Err(e) => {
                log_fallback("generating intro", &e);
                format!(
                    "Here are today's top {} AI and technology news stories:",
                    article_count
                )
            }
        }
    }

    /// Fill `ai_summary` on every article, one call at a time.
    pub async fn enrich(&self, articles: &mut [Article]) {
        for article in articles.iter_mut() {
            article.ai_summary = self.summarize(article).await;
        }
    }
}

fn log_fallback(action: &str, error: &GenerationError) {
    match error {
        GenerationError::Unavailable => {
            debug!("Text generation disabled, fallback used when {}", action)
        }
        other => warn!("Error {}: {}", action, other),
    }
}
