pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// A single news item pulled from a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub link: String,
    /// Publication date exactly as the feed wrote it; may be empty.
    pub published: String,
    /// Raw description/body from the feed; may be empty.
    pub summary: String,
    pub source: String,
    /// Filled in by enrichment, empty until then.
    pub ai_summary: String,
}

impl Article {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published: String::new(),
            summary: String::new(),
            source: UNKNOWN_SOURCE.to_string(),
            ai_summary: String::new(),
        }
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = published.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Lowercased `title + " " + summary`, the text every keyword rule looks at.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.summary).to_lowercase()
    }

    /// Dedup key for this article.
    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }
}

/// Lowercase, drop everything that is neither a word character nor whitespace,
/// and collapse runs of whitespace.
pub fn normalize_title(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_article_defaults() {
        let article = Article::new("Title", "https://example.com");
        assert_eq!(article.source, "Unknown Source");
        assert!(article.published.is_empty());
        assert!(article.summary.is_empty());
        assert!(article.ai_summary.is_empty());
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_title("AI Breakthrough!"), "ai breakthrough");
        assert_eq!(normalize_title("ai breakthrough"), "ai breakthrough");
        assert_eq!(normalize_title("GPT-5: What's next?"), "gpt5 whats next");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_title("  Open   AI \t news "), "open ai news");
        assert_eq!(normalize_title("A - B"), "a b");
    }

    #[test]
    fn test_normalize_keeps_underscores_and_unicode_letters() {
        assert_eq!(normalize_title("snake_case Über"), "snake_case über");
    }

    #[test]
    fn test_searchable_text() {
        let article = Article::new("New LLM", "https://x").with_summary("From OpenAI");
        assert_eq!(article.searchable_text(), "new llm from openai");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
