//! Crossref abstract lookup, the first stage of the abstract chain.
//!
//! API: https://api.crossref.org/works/{doi}
//! Polite pool: the shared client sends a User-Agent with a mailto.
//!
//! Crossref returns abstracts as JATS XML fragments. Only the markup tags are
//! removed here; the text between them is kept verbatim.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scholarwatch_common::sandbox::SandboxClient as Client;
use tracing::{debug, instrument};
use url::Url;

use super::{collapse_whitespace, AbstractSource};

const CR_API_BASE: &str = "https://api.crossref.org";

lazy_static! {
    static ref JATS_TAG: Regex =
        Regex::new(r"</?(?:jats:)?(title|italic|bold|underline|sub|sec|p)\b[^>]*>")
            .expect("JATS tag pattern is valid");
}

pub struct CrossRefClient {
    client: Client,
    base_url: String,
}

impl CrossRefClient {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: CR_API_BASE.to_string() }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// `{base}/works/{doi}` with the DOI parts encoded as path segments.
    fn work_url(&self, doi: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Crossref base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .push("works")
            .extend(doi.trim().split('/'));
        Ok(url)
    }
}

#[async_trait]
impl AbstractSource for CrossRefClient {
    fn name(&self) -> &str {
        "crossref"
    }

    #[instrument(skip(self))]
    async fn lookup(&self, doi: &str) -> anyhow::Result<Option<String>> {
        let url = self.work_url(doi)?;
        let resp = self.client.get(url.as_str())?.send().await?;
        if !resp.status().is_success() {
            debug!(status = %resp.status(), "Crossref has no record for DOI");
            return Ok(None);
        }

        let body: serde_json::Value = resp.json().await?;
        let cleaned = body["message"]["abstract"]
            .as_str()
            .map(clean_jats)
            .filter(|a| !a.is_empty());
        if cleaned.is_none() {
            debug!("Crossref record has no abstract");
        }
        Ok(cleaned)
    }
}

/// Strip JATS markup and normalise whitespace.
///
/// Block-level tags (`title`, `sec`, `p`) become a space so adjacent
/// paragraphs do not run together; inline tags vanish.
pub fn clean_jats(raw: &str) -> String {
    let stripped = JATS_TAG.replace_all(raw, |caps: &regex::Captures| {
        match &caps[1] {
            "title" | "sec" | "p" => " ",
            _ => "",
        }
    });
    collapse_whitespace(&stripped)
}
