//! One digest run end to end, plus the daily schedule loop around it.

use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use tracing::{error, info, warn};

use crate::aggregator::Aggregator;
use crate::categorizer::Categorizer;
use crate::config::Config;
use crate::delivery::{Digest, DigestDelivery, EmailCredentials, EmailSender, PreviewPrinter};
use crate::enrichment::Summarizer;

/// How a single run ended. None of these abort the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Sources were read but nothing survived the filters.
    NoArticles,
    /// Every configured source failed to fetch or parse.
    AllSourcesFailed { sources: usize },
    Delivered { articles: usize },
    DeliveryFailed { articles: usize, reason: String },
}

/// Result of assembling a digest before it is handed to a delivery.
#[derive(Debug)]
pub enum DigestBuild {
    Empty { all_sources_failed: bool, sources: usize },
    Ready { digest: Digest, total_found: usize },
}

pub struct DigestBot {
    aggregator: Aggregator,
    summarizer: Summarizer,
    categorizer: Categorizer,
    delivery: Box<dyn DigestDelivery>,
    preview_delivery: Box<dyn DigestDelivery>,
    preview_limit: usize,
}

impl DigestBot {
    pub fn new(
        aggregator: Aggregator,
        summarizer: Summarizer,
        categorizer: Categorizer,
        delivery: Box<dyn DigestDelivery>,
        preview_delivery: Box<dyn DigestDelivery>,
        preview_limit: usize,
    ) -> Self {
        Self {
            aggregator,
            summarizer,
            categorizer,
            delivery,
            preview_delivery,
            preview_limit,
        }
    }

    /// Wire up the production collaborators: feed fetcher, Anthropic or
    /// fallback summarizer, SMTP delivery and stdout previews.
    pub fn from_config(
        config: &Config,
        api_key: Option<String>,
        credentials: Option<EmailCredentials>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        if credentials.is_none() {
            warn!("Email credentials not set; digests can be previewed but not sent");
        }

        Ok(Self::new(
            Aggregator::from_config(config)?,
            Summarizer::from_config(config, api_key)?,
            Categorizer::new(&config.categories),
            Box::new(EmailSender::new(config.email.clone(), credentials)),
            Box::new(PreviewPrinter),
            config.preview_limit,
        ))
    }

    /// Aggregate, then enrich and categorize at most `limit` articles. The
    /// intro always counts everything that was found.
    pub async fn build_digest(&self, limit: Option<usize>) -> DigestBuild {
        info!("Aggregating latest AI news...");
        let report = self.aggregator.aggregate().await;

        if report.articles.is_empty() {
            return DigestBuild::Empty {
                all_sources_failed: report.all_sources_failed(),
                sources: report.sources.len(),
            };
        }

        let total_found = report.articles.len();
        info!("Found {} articles", total_found);

        let mut articles = report.articles;
        if let Some(limit) = limit {
            articles.truncate(limit);
        }

        info!("Generating AI summaries and categorizing...");
        self.summarizer.enrich(&mut articles).await;
        let intro = self.summarizer.generate_intro(total_found).await;
        let categories = self.categorizer.categorize(&articles);

        DigestBuild::Ready {
            digest: Digest {
                intro,
                articles,
                categories,
                generated_at: Local::now(),
            },
            total_found,
        }
    }

    /// Build the full digest and send it.
    pub async fn run_once(&self) -> RunOutcome {
        info!(
            "Starting Daily Dose of Tech - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        let digest = match self.build_digest(None).await {
            DigestBuild::Ready { digest, .. } => digest,
            DigestBuild::Empty {
                all_sources_failed,
                sources,
            } => return empty_outcome(all_sources_failed, sources),
        };

        let articles = digest.articles.len();
        info!("Sending email newsletter...");
        match self.delivery.deliver(&digest).await {
            Ok(()) => {
                info!("Daily digest sent successfully!");
                RunOutcome::Delivered { articles }
            }
            Err(e) => {
                error!("Failed to send email: {}. Check your configuration.", e);
                RunOutcome::DeliveryFailed {
                    articles,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Render the first few articles through the preview delivery.
    pub async fn preview(&self) -> RunOutcome {
        info!("Generating preview of today's digest...");

        let (digest, total_found) = match self.build_digest(Some(self.preview_limit)).await {
            DigestBuild::Ready {
                digest,
                total_found,
            } => (digest, total_found),
            DigestBuild::Empty {
                all_sources_failed,
                sources,
            } => return empty_outcome(all_sources_failed, sources),
        };

        let articles = digest.articles.len();
        let outcome = match self.preview_delivery.deliver(&digest).await {
            Ok(()) => RunOutcome::Delivered { articles },
            Err(e) => {
                error!("Failed to render preview: {}", e);
                RunOutcome::DeliveryFailed {
                    articles,
                    reason: e.to_string(),
                }
            }
        };

        let names: Vec<_> = digest.categories.iter().map(|(c, _)| c.name()).collect();
        info!("Total articles found: {}", total_found);
        info!("Categories: {:?}", names);

        outcome
    }

    /// Run once a day at local time `at` until Ctrl+C.
    pub async fn run_daily(&self, at: NaiveTime) {
        info!("Bot is running! Press Ctrl+C to stop.");
        self.run_daily_until(at, tokio::signal::ctrl_c()).await;
    }

    /// Run once a day at local time `at` until `shutdown` completes, whether
    /// that happens while waiting or in the middle of a run.
    pub async fn run_daily_until<F: Future>(&self, at: NaiveTime, shutdown: F) {
        info!("Scheduling daily digest for {}", at.format("%H:%M"));
        tokio::pin!(shutdown);

        loop {
            let now = Local::now().naive_local();
            let next = next_run_after(now, at);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!("Next run scheduled for: {}", next);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = &mut shutdown => break,
            }

            tokio::select! {
                outcome = self.run_once() => info!("Scheduled run finished: {:?}", outcome),
                _ = &mut shutdown => {
                    warn!("Stopped during a scheduled run; this digest was not completed");
                    break;
                }
            }
        }

        info!("Bot stopped by user.");
    }
}

fn empty_outcome(all_sources_failed: bool, sources: usize) -> RunOutcome {
    if all_sources_failed {
        warn!("All {} sources failed; no articles to send.", sources);
        RunOutcome::AllSourcesFailed { sources }
    } else {
        info!("No new articles found today.");
        RunOutcome::NoArticles
    }
}

/// The first moment strictly after `now` whose time of day is `at`.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}
