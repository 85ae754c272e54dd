//! PubMed Central abstract lookup, the second stage of the abstract chain.
//!
//! Two requests per DOI:
//! 1. ID converter: https://www.ncbi.nlm.nih.gov/pmc/utils/idconv/v1.0/?ids={doi}&format=json
//! 2. Article page: https://www.ncbi.nlm.nih.gov/pmc/articles/{pmcid}/
//!
//! The abstract is scraped from the article page HTML.

use async_trait::async_trait;
use scholarwatch_common::sandbox::SandboxClient as Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use super::{collapse_whitespace, AbstractSource};

const PMC_BASE: &str = "https://www.ncbi.nlm.nih.gov/pmc";
const ABSTRACT_SELECTOR: &str = "div.abstract, section.abstract, #abstract";

pub struct PmcClient {
    client: Client,
    base_url: String,
}

impl PmcClient {
    pub fn new(client: Client) -> Self {
        Self { client, base_url: PMC_BASE.to_string() }
    }

    /// Override the PMC root; both the converter and article URLs hang off it.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// DOI → PMCID, if PubMed Central holds the article.
    #[instrument(skip(self))]
    pub async fn resolve_pmcid(&self, doi: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/utils/idconv/v1.0/", self.base_url);
        let resp = self.client
            .get(&url)?
            .query(&[("ids", doi), ("format", "json")])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Ok(None);
        }

        let body: serde_json::Value = resp.json().await?;
        Ok(body["records"]
            .get(0)
            .and_then(|r| r["pmcid"].as_str())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from))
    }
}

#[async_trait]
impl AbstractSource for PmcClient {
    fn name(&self) -> &str {
        "pmc"
    }

    #[instrument(skip(self))]
    async fn lookup(&self, doi: &str) -> anyhow::Result<Option<String>> {
        let Some(pmcid) = self.resolve_pmcid(doi.trim()).await? else {
            debug!("DOI not indexed by PubMed Central");
            return Ok(None);
        };

        let url = format!("{}/articles/{}/", self.base_url, pmcid);
        let resp = self.client.get(&url)?.send().await?;
        if !resp.status().is_success() {
            debug!(%pmcid, status = %resp.status(), "PMC article page unavailable");
            return Ok(None);
        }
        let html = resp.text().await?;
        extract_abstract(&html)
    }
}

/// Text of the first abstract element on a PMC article page.
///
/// `Html` is not `Send`, so parsing stays in this synchronous helper.
pub fn extract_abstract(html: &str) -> anyhow::Result<Option<String>> {
    let selector = Selector::parse(ABSTRACT_SELECTOR)
        .map_err(|e| anyhow::anyhow!("invalid abstract selector: {e}"))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty()))
}
