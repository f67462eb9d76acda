//! Rendering a finished digest and handing it off: SMTP email for real runs,
//! stdout for previews.

use askama::Template;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::info;

use crate::article::Article;
use crate::categorizer::CategorizedArticles;
use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(
        "email delivery is not configured (set EMAIL_ADDRESS, EMAIL_PASSWORD and RECIPIENT_EMAIL)"
    )]
    NotConfigured,
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to render digest: {0}")]
    Render(#[from] askama::Error),
    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("send task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Everything a delivery needs for one run.
#[derive(Debug, Clone)]
pub struct Digest {
    pub intro: String,
    pub articles: Vec<Article>,
    pub categories: CategorizedArticles,
    pub generated_at: DateTime<Local>,
}

impl Digest {
    pub fn subject(&self) -> String {
        format!(
            "Daily Dose of Tech - {}",
            self.generated_at.format("%B %d, %Y")
        )
    }
}

#[async_trait]
pub trait DigestDelivery: Send + Sync {
    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError>;
}

struct ArticleView {
    title: String,
    link: String,
    source: String,
    published: String,
    summary: String,
}

struct SectionView {
    name: &'static str,
    articles: Vec<ArticleView>,
}

#[derive(Template)]
#[template(path = "digest.html")]
struct DigestHtml {
    date: String,
    intro: String,
    sections: Vec<SectionView>,
    total: usize,
}

#[derive(Template)]
#[template(path = "digest.txt")]
struct DigestText {
    date: String,
    intro: String,
    sections: Vec<SectionView>,
    total: usize,
}

fn sections(digest: &Digest) -> Vec<SectionView> {
    digest
        .categories
        .iter()
        .map(|(category, articles)| SectionView {
            name: category.name(),
            articles: articles
                .iter()
                .map(|a| ArticleView {
                    title: a.title.clone(),
                    link: a.link.clone(),
                    source: a.source.clone(),
                    published: a.published.clone(),
                    // Prefer the generated summary
                    summary: if a.ai_summary.is_empty() {
                        a.summary.clone()
                    } else {
                        a.ai_summary.clone()
                    },
                })
                .collect(),
        })
        .collect()
}

pub fn render_html(digest: &Digest) -> Result<String, DeliveryError> {
    let template = DigestHtml {
        date: digest.generated_at.format("%B %d, %Y").to_string(),
        intro: digest.intro.clone(),
        sections: sections(digest),
        total: digest.articles.len(),
    };
    Ok(template.render()?)
}

pub fn render_text(digest: &Digest) -> Result<String, DeliveryError> {
    let template = DigestText {
        date: digest.generated_at.format("%B %d, %Y").to_string(),
        intro: digest.intro.clone(),
        sections: sections(digest),
        total: digest.articles.len(),
    };
    Ok(template.render()?)
}

/// SMTP account and recipient, read from the environment.
#[derive(Clone)]
pub struct EmailCredentials {
    pub address: String,
    pub password: String,
    pub recipient: String,
}

impl std::fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl EmailCredentials {
    /// Returns `None` unless all of `EMAIL_ADDRESS`, `EMAIL_PASSWORD` and
    /// `RECIPIENT_EMAIL` are set.
    pub fn from_env() -> Option<Self> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Some(Self {
            address: read("EMAIL_ADDRESS")?,
            password: read("EMAIL_PASSWORD")?,
            recipient: read("RECIPIENT_EMAIL")?,
        })
    }
}

pub struct EmailSender {
    config: EmailConfig,
    credentials: Option<EmailCredentials>,
}

impl EmailSender {
    pub fn new(config: EmailConfig, credentials: Option<EmailCredentials>) -> Self {
        Self {
            config,
            credentials,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn build_message(&self, digest: &Digest) -> Result<Message, DeliveryError> {
        let credentials = self.credentials.as_ref().ok_or(DeliveryError::NotConfigured)?;

        let message = Message::builder()
            .from(parse_mailbox(&credentials.address)?)
            .to(parse_mailbox(&credentials.recipient)?)
            .subject(digest.subject())
            .multipart(MultiPart::alternative_plain_html(
                render_text(digest)?,
                render_html(digest)?,
            ))?;

        Ok(message)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| DeliveryError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl DigestDelivery for EmailSender {
    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        let credentials = self.credentials.clone().ok_or(DeliveryError::NotConfigured)?;
        let message = self.build_message(digest)?;

        let transport = SmtpTransport::starttls_relay(&self.config.smtp_server)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(credentials.address, credentials.password))
            .build();

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;

        info!("Email sent to {}", credentials.recipient);
        Ok(())
    }
}

/// Prints the plain-text digest instead of sending it.
#[derive(Debug, Default)]
pub struct PreviewPrinter;

#[async_trait]
impl DigestDelivery for PreviewPrinter {
    async fn deliver(&self, digest: &Digest) -> Result<(), DeliveryError> {
        println!("Subject: {}\n", digest.subject());
        println!("{}", render_text(digest)?);
        Ok(())
    }
}
