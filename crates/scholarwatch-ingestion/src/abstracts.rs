//! Abstract resolution: an ordered fallback chain of lookup stages.
//!
//! The default chain asks Crossref first and PubMed Central second. The first
//! stage returning non-empty text wins. Stage failures are logged and skipped;
//! resolving an abstract never fails a run.

use std::sync::Arc;

use scholarwatch_common::models::ABSTRACT_NOT_FOUND;
use scholarwatch_common::sandbox::SandboxClient;
use tracing::{debug, warn};

use crate::sources::crossref::CrossRefClient;
use crate::sources::pmc::PmcClient;
use crate::sources::AbstractSource;

/// Result of resolving one article's abstract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbstractOutcome {
    Found(String),
    /// The article had no usable DOI; no lookup was attempted.
    MissingDoi,
    /// Every stage came back empty or failed.
    NotFound,
}

impl AbstractOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Abstract text, or the shared placeholder.
    pub fn into_text(self) -> String {
        match self {
            Self::Found(text) => text,
            Self::MissingDoi | Self::NotFound => ABSTRACT_NOT_FOUND.to_string(),
        }
    }
}

pub struct AbstractResolver {
    stages: Vec<Arc<dyn AbstractSource>>,
}

impl AbstractResolver {
    pub fn new(stages: Vec<Arc<dyn AbstractSource>>) -> Self {
        Self { stages }
    }

    /// Crossref, then PubMed Central.
    pub fn default_chain(client: SandboxClient) -> Self {
        Self::new(vec![
            Arc::new(CrossRefClient::new(client.clone())),
            Arc::new(PmcClient::new(client)),
        ])
    }

    pub async fn resolve(&self, doi: Option<&str>) -> AbstractOutcome {
        let Some(doi) = doi.map(str::trim).filter(|d| !d.is_empty()) else {
            return AbstractOutcome::MissingDoi;
        };

        for stage in &self.stages {
            match stage.lookup(doi).await {
                Ok(Some(text)) if !text.trim().is_empty() => {
                    debug!(doi, stage = stage.name(), "Abstract resolved");
                    return AbstractOutcome::Found(text);
                }
                Ok(_) => debug!(doi, stage = stage.name(), "No abstract from stage"),
                Err(e) => warn!(doi, stage = stage.name(), error = %e, "Abstract lookup failed"),
            }
        }
        AbstractOutcome::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Text(&'static str),
        Empty,
        Fail,
    }

    struct CountingStage {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl CountingStage {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self { reply, calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AbstractSource for CountingStage {
        fn name(&self) -> &str {
            "counting"
        }

        async fn lookup(&self, _doi: &str) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Text(t) => Ok(Some(t.to_string())),
                Reply::Empty => Ok(None),
                Reply::Fail => anyhow::bail!("connection reset"),
            }
        }
    }

    fn chain(stages: &[&Arc<CountingStage>]) -> AbstractResolver {
        AbstractResolver::new(
            stages.iter().map(|s| Arc::clone(s) as Arc<dyn AbstractSource>).collect(),
        )
    }

    #[tokio::test]
    async fn test_first_stage_short_circuits() {
        let first = CountingStage::new(Reply::Text("From Crossref."));
        let second = CountingStage::new(Reply::Text("From PMC."));
        let outcome = chain(&[&first, &second]).resolve(Some("10.1/x")).await;

        assert_eq!(outcome, AbstractOutcome::Found("From Crossref.".to_string()));
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_empty_and_failing_stages() {
        let failing = CountingStage::new(Reply::Fail);
        let empty = CountingStage::new(Reply::Empty);
        let last = CountingStage::new(Reply::Text("From PMC."));
        let outcome = chain(&[&failing, &empty, &last]).resolve(Some("10.1/x")).await;

        assert_eq!(outcome.into_text(), "From PMC.");
        assert_eq!((failing.calls(), empty.calls(), last.calls()), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_blank_text_is_not_found() {
        let blank = CountingStage::new(Reply::Text("   "));
        let outcome = chain(&[&blank]).resolve(Some("10.1/x")).await;
        assert_eq!(outcome, AbstractOutcome::NotFound);
        assert_eq!(outcome.into_text(), ABSTRACT_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_doi_makes_no_calls() {
        let stage = CountingStage::new(Reply::Text("unused"));
        let resolver = chain(&[&stage]);

        assert_eq!(resolver.resolve(None).await, AbstractOutcome::MissingDoi);
        assert_eq!(resolver.resolve(Some("  ")).await, AbstractOutcome::MissingDoi);
        assert_eq!(stage.calls(), 0);
        assert_eq!(AbstractOutcome::MissingDoi.into_text(), ABSTRACT_NOT_FOUND);
    }
}
