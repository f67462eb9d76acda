use std::collections::HashSet;
use std::time::Duration;

use tracing::{error, info};

use crate::article::Article;
use crate::config::Config;
use crate::fetcher::{FetchError, Fetcher};
use crate::filters::{is_recent, is_relevant_article, KeywordSet};

/// What happened to one configured source during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// The feed was fetched; `kept` articles survived both filters.
    Fetched { fetched: usize, kept: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub url: String,
    pub outcome: SourceOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    /// Deduplicated articles, newest `published` first.
    pub articles: Vec<Article>,
    pub sources: Vec<SourceReport>,
}

impl AggregationReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources
            .iter()
            .filter(|s| matches!(s.outcome, SourceOutcome::Failed { .. }))
    }

    /// True when there were sources and not one of them could be read.
    pub fn all_sources_failed(&self) -> bool {
        !self.sources.is_empty() && self.failed_sources().count() == self.sources.len()
    }
}

pub struct Aggregator {
    fetcher: Fetcher,
    sources: Vec<String>,
    relevance: KeywordSet,
    lookback_days: i64,
}

impl Aggregator {
    pub fn new(
        fetcher: Fetcher,
        sources: Vec<String>,
        relevance: KeywordSet,
        lookback_days: i64,
    ) -> Self {
        Self {
            fetcher,
            sources,
            relevance,
            lookback_days,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let fetcher = Fetcher::new(
            Duration::from_secs(config.request_timeout_secs),
            config.max_articles_per_source,
        )?;
        Ok(Self::new(
            fetcher,
            config.sources.clone(),
            KeywordSet::new(&config.relevance_keywords),
            config.lookback_days,
        ))
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Fetch every source in order, keep relevant and recent articles,
    /// collapse duplicate titles and order by `published`.
    pub async fn aggregate(&self) -> AggregationReport {
        let mut collected = Vec::new();
        let mut reports = Vec::with_capacity(self.sources.len());

        for url in &self.sources {
            let outcome = match self.fetcher.try_fetch(url).await {
                Ok(articles) => {
                    let fetched = articles.len();
                    let survivors = self.filter(articles);
                    let kept = survivors.len();
                    collected.extend(survivors);
                    SourceOutcome::Fetched { fetched, kept }
                }
                Err(e) => {
                    error!("Error fetching RSS feed {}: {}", url, e);
                    SourceOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            reports.push(SourceReport {
                url: url.clone(),
                outcome,
            });
        }

        let mut articles = dedupe_by_title(collected);
        sort_by_published(&mut articles);

        info!(
            "Aggregated {} articles from {} sources",
            articles.len(),
            self.sources.len()
        );

        AggregationReport {
            articles,
            sources: reports,
        }
    }

    /// Relevance first, then recency.
    pub fn filter(&self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .filter(|a| is_relevant_article(a, &self.relevance))
            .filter(|a| is_recent(&a.published, self.lookback_days))
            .collect()
    }
}

/// Keep the first article for each normalized title, preserving order.
pub fn dedupe_by_title(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| seen.insert(a.normalized_title()))
        .collect()
}

/// Stable descending sort on the raw `published` text. This is a plain string
/// comparison: only ISO-style dates come out chronological.
pub fn sort_by_published(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published.cmp(&a.published));
}
