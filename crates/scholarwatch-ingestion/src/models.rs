//! Data models for the ingestion stage.

use serde::{Deserialize, Serialize};

/// One search request sent to a literature source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
}

/// A search hit after field mapping, before abstract resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub authors: Vec<String>,
    pub doi: Option<String>,
    pub publication_date: String,
    pub source: String,
}
