use serde::Deserialize;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no feed sources configured")]
    NoSources,
    #[error("invalid schedule time '{0}', expected HH:MM")]
    InvalidScheduleTime(String),
    #[error("lookback_days must be between 0 and {max}, got {value}")]
    InvalidLookbackDays { value: i64, max: i64 },
}

/// Upper bound on the recency window, about ten years.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Feed URLs, fetched in this order
    pub sources: Vec<String>,
    #[serde(default = "default_relevance_keywords")]
    pub relevance_keywords: Vec<String>,
    #[serde(default)]
    pub categories: CategoryKeywords,
    #[serde(default = "default_max_articles_per_source")]
    pub max_articles_per_source: usize,
    #[serde(default = "default_max_summary_length")]
    pub max_summary_length: usize,
    /// Recency window in days
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// Timeout applied to every outbound HTTP request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Local time of day for `daemon` runs
    #[serde(default = "default_schedule_time")]
    pub schedule_time: String,
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

/// Keyword sets for the four keyword-driven categories, checked in this order.
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryKeywords {
    #[serde(default = "default_research_keywords")]
    pub research: Vec<String>,
    #[serde(default = "default_products_keywords")]
    pub products: Vec<String>,
    #[serde(default = "default_regulation_keywords")]
    pub regulation: Vec<String>,
    #[serde(default = "default_funding_keywords")]
    pub funding: Vec<String>,
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        Self {
            research: default_research_keywords(),
            products: default_products_keywords(),
            regulation: default_regulation_keywords(),
            funding: default_funding_keywords(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnrichmentConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
    #[serde(default = "default_intro_max_tokens")]
    pub intro_max_tokens: u32,
    #[serde(default = "default_intro_temperature")]
    pub intro_temperature: f32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            summary_max_tokens: default_summary_max_tokens(),
            summary_temperature: default_summary_temperature(),
            intro_max_tokens: default_intro_max_tokens(),
            intro_temperature: default_intro_temperature(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
        }
    }
}

fn default_max_articles_per_source() -> usize {
    5
}

fn default_max_summary_length() -> usize {
    150
}

fn default_lookback_days() -> i64 {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_schedule_time() -> String {
    "08:00".to_string()
}

fn default_preview_limit() -> usize {
    5
}

fn default_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_summary_max_tokens() -> u32 {
    60
}

fn default_summary_temperature() -> f32 {
    0.3
}

fn default_intro_max_tokens() -> u32 {
    70
}

fn default_intro_temperature() -> f32 {
    0.7
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn default_relevance_keywords() -> Vec<String> {
    strings(&[
        "artificial intelligence",
        "machine learning",
        "deep learning",
        "neural network",
        "chatgpt",
        "openai",
        "anthropic",
        "claude",
        "llm",
        "large language model",
        "generative ai",
        "gpt",
        "transformer",
        "bert",
        "nlp",
        "computer vision",
        "reinforcement learning",
        "pytorch",
        "tensorflow",
        "ai research",
        "ai safety",
        "automation",
        "robotics",
        "ai ethics",
        "ai regulation",
        "ai startup",
    ])
}

fn default_research_keywords() -> Vec<String> {
    strings(&["research", "paper", "study", "breakthrough", "algorithm"])
}

fn default_products_keywords() -> Vec<String> {
    strings(&["product", "launch", "release", "chatgpt", "claude", "service"])
}

fn default_regulation_keywords() -> Vec<String> {
    strings(&["regulation", "ethics", "policy", "law", "government"])
}

fn default_funding_keywords() -> Vec<String> {
    strings(&["startup", "funding", "investment", "raise", "venture"])
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply `SMTP_SERVER` / `SMTP_PORT` overrides from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(server) = std::env::var("SMTP_SERVER") {
            self.email.smtp_server = server;
        }
        if let Some(port) = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.email.smtp_port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        if !(0..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::InvalidLookbackDays {
                value: self.lookback_days,
                max: MAX_LOOKBACK_DAYS,
            });
        }
        parse_schedule_time(&self.schedule_time)?;
        Ok(())
    }
}

/// Parse a local `HH:MM` time of day.
pub fn parse_schedule_time(value: &str) -> Result<chrono::NaiveTime, ConfigError> {
    chrono::NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidScheduleTime(value.to_string()))
}
