//! Data models shared by the digest pipeline.
//!
//! Nothing here outlives a single run: articles are created by the search
//! client, summaries by the summarizer, and the digest is consumed by the
//! renderer and mailer.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::WatchError;

/// Lowest relevance score a validated summary may carry.
pub const RELEVANCE_MIN: u8 = 1;
/// Highest relevance score a validated summary may carry.
pub const RELEVANCE_MAX: u8 = 20;
/// Upper bound on key points per summary.
pub const MAX_KEY_POINTS: usize = 5;

/// Placeholder abstract used whenever no abstract could be obtained,
/// whether the DOI was missing or every lookup stage came back empty.
pub const ABSTRACT_NOT_FOUND: &str = "Abstract not found.";

/// Placeholder review text used when the review call fails.
pub const REVIEW_UNAVAILABLE: &str = "Literature review unavailable for this digest.";

const DOI_RESOLVER: &str = "https://doi.org";

/// A search hit enriched with its abstract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub doi: Option<String>,
    /// Year granularity in practice (e.g. "2026"); empty when unknown.
    pub publication_date: String,
    /// Venue name.
    pub source: String,
}

impl Article {
    pub fn doi_url(&self) -> Option<String> {
        self.doi.as_deref().map(doi_url)
    }
}

/// Structured LLM assessment of one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub authors: Vec<String>,
    pub doi: Option<String>,
    pub publication_date: String,
    pub key_points: Vec<String>,
    /// Always within `RELEVANCE_MIN..=RELEVANCE_MAX` once validated.
    pub relevance_score: u8,
    pub methodology: Option<String>,
    pub theoretical_framework: Option<String>,
}

impl ArticleSummary {
    pub fn doi_url(&self) -> Option<String> {
        self.doi.as_deref().map(doi_url)
    }
}

/// Aggregated output of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDigest {
    /// Run date, `YYYY-MM-DD`.
    pub date: String,
    /// Summaries in search-result order.
    pub summaries: Vec<ArticleSummary>,
    /// Number of articles fetched, independent of summarization success.
    pub total_articles: usize,
}

impl DailyDigest {
    pub fn new(
        date: impl Into<String>,
        summaries: Vec<ArticleSummary>,
        total_articles: usize,
    ) -> Result<Self, WatchError> {
        if summaries.len() > total_articles {
            return Err(WatchError::Pipeline(format!(
                "{} summaries for only {} fetched articles",
                summaries.len(),
                total_articles
            )));
        }
        Ok(Self { date: date.into(), summaries, total_articles })
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

/// Response shape of the review call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiteratureReview {
    pub review: String,
}

/// Resolver link for `doi`. Each `/`-separated part is percent-encoded as a
/// path segment, so `#`, `?` and `%` stay part of the DOI.
pub fn doi_url(doi: &str) -> String {
    let Ok(mut url) = Url::parse(DOI_RESOLVER) else {
        return format!("{}/{}", DOI_RESOLVER, doi.trim());
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(doi.trim().split('/'));
    }
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(title: &str) -> ArticleSummary {
        ArticleSummary {
            title: title.to_string(),
            authors: vec!["Jane Doe".to_string()],
            doi: Some("10.1000/test".to_string()),
            publication_date: "2026".to_string(),
            key_points: vec!["A point".to_string()],
            relevance_score: 12,
            methodology: None,
            theoretical_framework: None,
        }
    }

    #[test]
    fn test_digest_rejects_more_summaries_than_articles() {
        let result = DailyDigest::new("2026-10-19", vec![summary("a"), summary("b")], 1);
        assert!(matches!(result, Err(WatchError::Pipeline(_))));
    }

    #[test]
    fn test_digest_allows_partial_summarization() {
        let digest = DailyDigest::new("2026-10-19", vec![summary("a")], 3).unwrap();
        assert_eq!(digest.total_articles, 3);
        assert_eq!(digest.summaries.len(), 1);
        assert!(!digest.is_empty());
    }

    #[test]
    fn test_doi_url() {
        assert_eq!(doi_url("10.1038/nature14539"), "https://doi.org/10.1038/nature14539");
        assert_eq!(summary("a").doi_url().as_deref(), Some("https://doi.org/10.1000/test"));
    }

    #[test]
    fn test_doi_url_encodes_reserved_characters() {
        assert_eq!(doi_url("10.1000/a#b"), "https://doi.org/10.1000/a%23b");
        assert_eq!(doi_url("10.1000/x?y=1"), "https://doi.org/10.1000/x%3Fy=1");
        assert_eq!(doi_url("10.1000/50%off"), "https://doi.org/10.1000/50%25off");
        assert_eq!(doi_url(" 10.1000/two words "), "https://doi.org/10.1000/two%20words");
        assert_eq!(
            doi_url("10.1016/S0140-6736(20)30183-5"),
            "https://doi.org/10.1016/S0140-6736(20)30183-5"
        );
    }

    #[test]
    fn test_article_serializes_abstract_field_name() {
        let article = Article {
            title: "T".to_string(),
            authors: vec![],
            abstract_text: ABSTRACT_NOT_FOUND.to_string(),
            doi: None,
            publication_date: String::new(),
            source: String::new(),
        };
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["abstract"], ABSTRACT_NOT_FOUND);
        assert!(article.doi_url().is_none());
    }
}
