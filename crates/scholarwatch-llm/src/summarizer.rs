//! Article assessment and literature-review synthesis on top of an `LlmBackend`.
//!
//! The model only supplies the judgement fields (key points, score,
//! methodology, framework). Bibliographic fields are copied from the article
//! so a hallucinated title or DOI can never reach the digest.

use std::sync::Arc;

use async_trait::async_trait;
use scholarwatch_common::models::{
    Article, ArticleSummary, LiteratureReview, MAX_KEY_POINTS, RELEVANCE_MAX, RELEVANCE_MIN,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::backend::{LlmBackend, LlmError, LlmRequest, Message};
use crate::{prompts, schema};

/// Capability used by the pipeline; one implementation per run.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, article: &Article, thesis_subject: &str) -> Result<ArticleSummary, LlmError>;

    /// `summaries_text` is the formatted concatenation of the run's summaries.
    async fn generate_review(&self, summaries_text: &str) -> Result<String, LlmError>;
}

/// Raw judgement as returned by the model, before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummaryPayload {
    key_points: Vec<String>,
    relevance_score: i64,
    methodology: Option<String>,
    theoretical_framework: Option<String>,
}

pub struct LlmSummarizer {
    backend: Arc<dyn LlmBackend>,
    language: String,
}

impl LlmSummarizer {
    pub fn new(backend: Arc<dyn LlmBackend>, language: impl Into<String>) -> Self {
        Self { backend, language: language.into() }
    }

    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    #[instrument(skip(self, article, thesis_subject), fields(title = %article.title))]
    async fn summarize(&self, article: &Article, thesis_subject: &str) -> Result<ArticleSummary, LlmError> {
        let req = LlmRequest {
            messages: vec![
                Message::system(prompts::summary_system_prompt(thesis_subject, &self.language)),
                Message::user(prompts::format_article(article)),
            ],
            response_format: Some(schema::article_summary_format()),
            ..Default::default()
        };
        let resp = self.backend.complete(req).await?;
        let payload: SummaryPayload = serde_json::from_str(strip_code_fence(&resp.content))?;
        let summary = validate_summary(payload, article)?;
        debug!(score = summary.relevance_score, key_points = summary.key_points.len(), "Article summarized");
        Ok(summary)
    }

    #[instrument(skip_all)]
    async fn generate_review(&self, summaries_text: &str) -> Result<String, LlmError> {
        let req = LlmRequest {
            messages: vec![
                Message::system(prompts::review_system_prompt(&self.language)),
                Message::user(summaries_text),
            ],
            response_format: Some(schema::literature_review_format()),
            ..Default::default()
        };
        let resp = self.backend.complete(req).await?;
        let review: LiteratureReview = serde_json::from_str(strip_code_fence(&resp.content))?;
        let text = review.review.trim();
        if text.is_empty() {
            return Err(LlmError::Validation("empty literature review".to_string()));
        }
        Ok(text.to_string())
    }
}

fn validate_summary(payload: SummaryPayload, article: &Article) -> Result<ArticleSummary, LlmError> {
    let key_points: Vec<String> = payload
        .key_points
        .into_iter()
        .map(|p| p.trim().to_string())
        .collect();
    if key_points.is_empty() || key_points.len() > MAX_KEY_POINTS {
        return Err(LlmError::Validation(format!(
            "expected 1 to {MAX_KEY_POINTS} key points, got {}",
            key_points.len()
        )));
    }
    if key_points.iter().any(|p| p.is_empty()) {
        return Err(LlmError::Validation("blank key point".to_string()));
    }

    let score = payload.relevance_score;
    if score < i64::from(RELEVANCE_MIN) || score > i64::from(RELEVANCE_MAX) {
        return Err(LlmError::Validation(format!(
            "relevance score {score} outside {RELEVANCE_MIN}..={RELEVANCE_MAX}"
        )));
    }

    Ok(ArticleSummary {
        title: article.title.clone(),
        authors: article.authors.clone(),
        doi: article.doi.clone(),
        publication_date: article.publication_date.clone(),
        key_points,
        relevance_score: score as u8,
        methodology: non_blank(payload.methodology),
        theoretical_framework: non_blank(payload.theoretical_framework),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Local models sometimes wrap JSON in a Markdown fence despite `format`.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
