use std::time::Duration;

use feed_rs::parser;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::article::{Article, UNKNOWN_SOURCE};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to parse feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

pub struct Fetcher {
    client: Client,
    max_articles: usize,
}

impl Fetcher {
    pub fn new(timeout: Duration, max_articles: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("DailyDose/1.0 (News Digest)")
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            max_articles,
        })
    }

    /// Best-effort fetch: any failure is logged and yields no articles.
    pub async fn fetch(&self, url: &str) -> Vec<Article> {
        match self.try_fetch(url).await {
            Ok(articles) => articles,
            Err(e) => {
                error!("Error fetching RSS feed {}: {}", url, e);
                Vec::new()
            }
        }
    }

    pub async fn try_fetch(&self, url: &str) -> Result<Vec<Article>, FetchError> {
        info!("Fetching from: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let bytes = response.bytes().await?;

        let articles = Self::parse_feed(&bytes, self.max_articles)?;
        debug!("Parsed {} articles from {}", articles.len(), url);
        Ok(articles)
    }

    /// Turn feed bytes into at most `max_articles` articles, taken from the
    /// head of the feed.
    pub fn parse_feed(bytes: &[u8], max_articles: usize) -> Result<Vec<Article>, FetchError> {
        let parsed = parser::parse(bytes)?;

        // feed_rs normalises dates to UTC; keep the feed's own date text
        // instead. Entries line up with the raw blocks by position.
        let raw_dates = Self::extract_raw_dates_from_xml(bytes);
        let raw_dates = if raw_dates.len() == parsed.entries.len() {
            raw_dates
        } else {
            debug!(
                "Raw date scan found {} entries, parser found {}; using parsed dates",
                raw_dates.len(),
                parsed.entries.len()
            );
            Vec::new()
        };

        let source = parsed
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        let mut articles = Vec::new();
        for (index, entry) in parsed.entries.into_iter().enumerate().take(max_articles) {
            let Some(title) = entry
                .title
                .as_ref()
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
            else {
                warn!("Skipping entry with no title in '{}'", source);
                continue;
            };

            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            if link.is_empty() {
                warn!("Skipping entry with no link: {}", title);
                continue;
            }

            let published = raw_dates
                .get(index)
                .cloned()
                .flatten()
                .or_else(|| entry.published.or(entry.updated).map(|dt| dt.to_rfc3339()))
                .unwrap_or_default();

            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            articles.push(Article {
                title,
                link,
                published,
                summary,
                source: source.clone(),
                ai_summary: String::new(),
            });
        }

        Ok(articles)
    }

    /// Raw date text of every entry, in document order. RSS items use
    /// <pubDate> or <dc:date>; Atom entries use <published>, then <updated>.
    pub fn extract_raw_dates_from_xml(xml_bytes: &[u8]) -> Vec<Option<String>> {
        let xml_str = match std::str::from_utf8(xml_bytes) {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };

        let mut blocks = Self::element_blocks(xml_str, "item");
        let mut date_tags: &[&str] = &["pubDate", "dc:date"];
        if blocks.is_empty() {
            blocks = Self::element_blocks(xml_str, "entry");
            date_tags = &["published", "updated"];
        }

        blocks
            .into_iter()
            .map(|block| {
                date_tags.iter().find_map(|tag| {
                    Self::extract_xml_element(block, tag).filter(|d| !d.is_empty())
                })
            })
            .collect()
    }

    /// Bodies of every `<tag ...>...</tag>` element, attributes included.
    fn element_blocks<'a>(xml: &'a str, tag: &str) -> Vec<&'a str> {
        let open = format!("<{}", tag);
        let close = format!("</{}>", tag);

        let mut blocks = Vec::new();
        let mut rest = xml;
        while let Some(start) = rest.find(&open) {
            let after = &rest[start + open.len()..];
            // Skip longer names sharing the prefix, e.g. <items>
            if !after.starts_with(|c: char| c == '>' || c.is_whitespace()) {
                rest = after;
                continue;
            }
            let end = after.find(&close).unwrap_or(after.len());
            blocks.push(&after[..end]);
            rest = &after[end..];
        }

        blocks
    }

    pub fn extract_xml_element(xml: &str, tag: &str) -> Option<String> {
        let start_tag = format!("<{}>", tag);
        let end_tag = format!("</{}>", tag);

        let start = xml.find(&start_tag)? + start_tag.len();
        let end = xml[start..].find(&end_tag)? + start;

        Some(xml[start..end].trim().to_string())
    }
}
