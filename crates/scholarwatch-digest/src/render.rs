//! HTML rendering of a `DailyDigest`.
//!
//! The template is compiled into the binary and rendered with HTML
//! auto-escaping, so every API- or model-derived string is escaped. The
//! review is the only pre-rendered fragment; it goes through
//! [`markup::review_to_html`](crate::markup::review_to_html) first.

use minijinja::{context, Environment, Value};
use scholarwatch_common::models::{ArticleSummary, DailyDigest, RELEVANCE_MAX};
use scholarwatch_common::WatchError;
use serde::Serialize;
use tracing::debug;

use crate::authors::format_authors;
use crate::markup::review_to_html;

const TEMPLATE_NAME: &str = "digest.html";
const TEMPLATE_SOURCE: &str = include_str!("../templates/digest.html");

/// Per-article view handed to the template.
#[derive(Debug, Serialize)]
struct SummaryView<'a> {
    title: &'a str,
    authors: String,
    publication_date: &'a str,
    doi: Option<&'a str>,
    doi_url: Option<String>,
    key_points: &'a [String],
    relevance_score: u8,
    methodology: Option<&'a str>,
    theoretical_framework: Option<&'a str>,
}

impl<'a> From<&'a ArticleSummary> for SummaryView<'a> {
    fn from(s: &'a ArticleSummary) -> Self {
        Self {
            title: &s.title,
            authors: format_authors(&s.authors),
            publication_date: &s.publication_date,
            doi: s.doi.as_deref(),
            doi_url: s.doi_url(),
            key_points: &s.key_points,
            relevance_score: s.relevance_score,
            methodology: s.methodology.as_deref(),
            theoretical_framework: s.theoretical_framework.as_deref(),
        }
    }
}

pub struct DigestRenderer {
    env: Environment<'static>,
}

impl DigestRenderer {
    pub fn new() -> Result<Self, WatchError> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE_SOURCE)
            .map_err(|e| WatchError::Template(e.to_string()))?;
        Ok(Self { env })
    }

    /// Render the digest. An empty digest is rejected rather than rendered.
    pub fn render(&self, digest: &DailyDigest, review: &str) -> Result<String, WatchError> {
        if digest.is_empty() {
            return Err(WatchError::EmptyDigest);
        }

        let summaries: Vec<SummaryView<'_>> = digest.summaries.iter().map(SummaryView::from).collect();
        let template = self.env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| WatchError::Template(e.to_string()))?;
        let html = template
            .render(context! {
                date => &digest.date,
                summarized => digest.summaries.len(),
                total_articles => digest.total_articles,
                relevance_max => RELEVANCE_MAX,
                review_html => Value::from_safe_string(review_to_html(review)),
                summaries => summaries,
            })
            .map_err(|e| WatchError::Template(e.to_string()))?;

        debug!(bytes = html.len(), articles = digest.summaries.len(), "Digest rendered");
        Ok(html)
    }
}
