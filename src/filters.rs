//! Relevance and recency gates applied to every fetched article.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};

use crate::article::Article;

/// A case-insensitive keyword lexicon. Keywords are stored lowercased so
/// matching only has to lowercase the haystack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// True if any keyword occurs in `lowercase_text`. The caller lowercases.
    pub fn matches_lowercase(&self, lowercase_text: &str) -> bool {
        self.keywords.iter().any(|k| lowercase_text.contains(k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Substring match of any keyword against the lowercased text.
pub fn is_relevant(text: &str, keywords: &KeywordSet) -> bool {
    keywords.matches_lowercase(&text.to_lowercase())
}

pub fn is_relevant_article(article: &Article, keywords: &KeywordSet) -> bool {
    keywords.matches_lowercase(&article.searchable_text())
}

// Offset-carrying formats not covered by RFC 2822 / RFC 3339.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a, %d %b %Y",
    "%m/%d/%Y",
];

/// Leniently parse a feed date into a wall-clock timestamp, discarding any
/// timezone. Date-only values land on midnight.
pub fn parse_published(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    // Trailing zone names such as "GMT" or "UTC" carry no offset we need.
    let without_zone = strip_zone_name(value);

    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(without_zone, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(without_zone, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

fn strip_zone_name(value: &str) -> &str {
    match value.rsplit_once(' ') {
        Some((head, tail))
            if !tail.is_empty()
                && tail.len() <= 4
                && tail.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            head.trim_end()
        }
        _ => value,
    }
}

/// Fail-open recency check against the local clock.
pub fn is_recent(published: &str, lookback_days: i64) -> bool {
    is_recent_at(published, lookback_days, Local::now().naive_local())
}

/// Recency check against an explicit `now`. Anything that does not parse is
/// treated as recent.
pub fn is_recent_at(published: &str, lookback_days: i64, now: NaiveDateTime) -> bool {
    match parse_published(published) {
        Some(date) => match Duration::try_days(lookback_days)
            .and_then(|window| now.checked_sub_signed(window))
        {
            Some(cutoff) => date >= cutoff,
            None => {
                tracing::debug!(lookback_days, "Lookback window out of range, keeping article");
                true
            }
        },
        None => {
            tracing::debug!(published, "Unparseable publish date, keeping article");
            true
        }
    }
}
