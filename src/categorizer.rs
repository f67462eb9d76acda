use std::fmt;

use crate::article::Article;
use crate::config::CategoryKeywords;
use crate::filters::KeywordSet;

/// Digest sections, declared in the order rules are checked and sections are
/// shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Research,
    Products,
    Regulation,
    Funding,
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Research,
        Category::Products,
        Category::Regulation,
        Category::Funding,
        Category::General,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Research => "AI Research & Development",
            Category::Products => "AI Products & Services",
            Category::Regulation => "AI Regulation & Ethics",
            Category::Funding => "AI Startups & Funding",
            Category::General => "General Tech News",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-empty categories with their articles, in `Category` order.
pub type CategorizedArticles = Vec<(Category, Vec<Article>)>;

#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: Vec<(Category, KeywordSet)>,
}

impl Categorizer {
    pub fn new(keywords: &CategoryKeywords) -> Self {
        Self {
            rules: vec![
                (Category::Research, KeywordSet::new(&keywords.research)),
                (Category::Products, KeywordSet::new(&keywords.products)),
                (Category::Regulation, KeywordSet::new(&keywords.regulation)),
                (Category::Funding, KeywordSet::new(&keywords.funding)),
            ],
        }
    }

    /// First rule that matches wins; anything unmatched is general news.
    pub fn classify(&self, article: &Article) -> Category {
        let text = article.searchable_text();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.matches_lowercase(&text))
            .map(|(category, _)| *category)
            .unwrap_or(Category::General)
    }

    pub fn categorize(&self, articles: &[Article]) -> CategorizedArticles {
        let mut buckets: Vec<(Category, Vec<Article>)> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();

        for article in articles {
            let category = self.classify(article);
            if let Some((_, bucket)) = buckets.iter_mut().find(|(c, _)| *c == category) {
                bucket.push(article.clone());
            }
        }

        buckets.retain(|(_, bucket)| !bucket.is_empty());
        buckets
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(&CategoryKeywords::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, summary: &str) -> Article {
        Article::new(title, format!("https://example.com/{}", title)).with_summary(summary)
    }

    #[test]
    fn test_category_names_and_order() {
        let names: Vec<_> = Category::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "AI Research & Development",
                "AI Products & Services",
                "AI Regulation & Ethics",
                "AI Startups & Funding",
                "General Tech News",
            ]
        );
        assert_eq!(Category::Funding.to_string(), "AI Startups & Funding");
    }

    #[test]
    fn test_classify_each_category() {
        let categorizer = Categorizer::default();
        assert_eq!(
            categorizer.classify(&article("New paper on attention", "")),
            Category::Research
        );
        assert_eq!(
            categorizer.classify(&article("Anthropic updates Claude", "")),
            Category::Products
        );
        assert_eq!(
            categorizer.classify(&article("EU AI Act", "New regulation for models")),
            Category::Regulation
        );
        assert_eq!(
            categorizer.classify(&article("Robotics firm", "closes Series A funding")),
            Category::Funding
        );
        assert_eq!(
            categorizer.classify(&article("Chip shortage eases", "")),
            Category::General
        );
    }

    #[test]
    fn test_research_beats_funding() {
        let categorizer = Categorizer::default();
        let a = article("Lab raises funding", "to expand research");
        assert_eq!(categorizer.classify(&a), Category::Research);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let categorizer = Categorizer::default();
        assert_eq!(
            categorizer.classify(&article("BREAKTHROUGH in robotics", "")),
            Category::Research
        );
    }

    #[test]
    fn test_empty_buckets_omitted_and_order_fixed() {
        let categorizer = Categorizer::default();
        let articles = vec![
            article("Startup raises seed round", ""),
            article("Quiet week in hardware", ""),
            article("Study finds", ""),
        ];

        let result = categorizer.categorize(&articles);
        let categories: Vec<_> = result.iter().map(|(c, _)| *c).collect();

        assert_eq!(
            categories,
            vec![Category::Research, Category::Funding, Category::General]
        );
        assert!(result.iter().all(|(_, bucket)| !bucket.is_empty()));
    }

    #[test]
    fn test_partition_has_no_duplicates_or_omissions() {
        let categorizer = Categorizer::default();
        let articles = vec![
            article("Research and product launch", ""),
            article("Government policy", "funding startups"),
            article("ChatGPT release", ""),
            article("Weather", ""),
            article("Venture capital", ""),
        ];

        let result = categorizer.categorize(&articles);
        let mut seen: Vec<_> = result
            .iter()
            .flat_map(|(_, bucket)| bucket.iter().map(|a| a.title.clone()))
            .collect();
        seen.sort();
        let mut expected: Vec<_> = articles.iter().map(|a| a.title.clone()).collect();
        expected.sort();

        assert_eq!(seen, expected);
    }

    #[test]
    fn test_preserves_article_order_within_bucket() {
        let categorizer = Categorizer::default();
        let articles = vec![article("Weather", ""), article("Traffic", "")];
        let result = categorizer.categorize(&articles);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].1[0].title, "Weather");
        assert_eq!(result[0].1[1].title, "Traffic");
    }

    #[test]
    fn test_empty_input() {
        assert!(Categorizer::default().categorize(&[]).is_empty());
    }

    #[test]
    fn test_custom_keywords() {
        let keywords = CategoryKeywords {
            research: vec!["rfc".to_string()],
            products: vec![],
            regulation: vec![],
            funding: vec!["ipo".to_string()],
        };
        let categorizer = Categorizer::new(&keywords);
        assert_eq!(categorizer.classify(&article("New RFC", "")), Category::Research);
        assert_eq!(categorizer.classify(&article("Big IPO", "")), Category::Funding);
        assert_eq!(categorizer.classify(&article("New paper", "")), Category::General);
    }
}
