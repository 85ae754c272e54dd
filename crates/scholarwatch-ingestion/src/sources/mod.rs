//! Literature source clients.

pub mod crossref;
pub mod pmc;
pub mod wos;

use async_trait::async_trait;
use crate::models::{SearchHit, SearchRequest};

/// A bibliographic search service.
///
/// Transport, authentication and quota failures are returned as errors and
/// abort the run; malformed individual hits are dropped by the implementation.
#[async_trait]
pub trait LiteratureSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, request: &SearchRequest) -> anyhow::Result<Vec<SearchHit>>;
}

/// One stage of the abstract fallback chain.
#[async_trait]
pub trait AbstractSource: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the stage had nothing for this DOI; `Err` means the
    /// stage itself failed. The resolver treats both as "try the next stage".
    async fn lookup(&self, doi: &str) -> anyhow::Result<Option<String>>;
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
