//! Web of Science Starter API client.
//!
//! Endpoint: https://api.clarivate.com/apis/wos-starter/v1/documents
//! Auth:     `X-ApiKey` header
//!
//! The response schema is not ours, so hits are unwrapped field by field from
//! a `serde_json::Value`. Missing fields become placeholders; a field of the
//! wrong JSON type makes that single hit unmappable and it is skipped.

use async_trait::async_trait;
use reqwest::StatusCode;
use scholarwatch_common::sandbox::SandboxClient as Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::models::{SearchHit, SearchRequest};
use super::LiteratureSearch;

const WOS_API_BASE: &str = "https://api.clarivate.com/apis/wos-starter/v1";
const WOS_DATABASE: &str = "WOS";
/// Load date, descending.
const WOS_SORT:     &str = "LD+D";
/// Starter API hard limit per page.
/// Largest page the Starter API serves.
pub const WOS_MAX_PAGE: usize = 50;

pub struct WosClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl WosClient {
    pub fn new(client: Client, api_key: SecretString) -> Self {
        Self { client, api_key, base_url: WOS_API_BASE.to_string() }
    }

    /// Point the client at another deployment (or a local stand-in).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LiteratureSearch for WosClient {
    fn name(&self) -> &str {
        "Web of Science"
    }

    #[instrument(skip(self))]
    async fn search(&self, request: &SearchRequest) -> anyhow::Result<Vec<SearchHit>> {
        let url = format!("{}/documents", self.base_url);
        let limit = request.max_results.clamp(1, WOS_MAX_PAGE).to_string();

        let resp = self.client
            .get(&url)?
            .header("X-ApiKey", self.api_key.expose_secret())
            .query(&[
                ("q",         request.query.as_str()),
                ("db",        WOS_DATABASE),
                ("limit",     limit.as_str()),
                ("page",      "1"),
                ("sortField", WOS_SORT),
                ("detail",    "full"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(describe_failure(status, &body));
        }

        let body: Value = resp.json().await?;
        let hits = map_hits(&body);
        info!(n = hits.len(), "Web of Science search returned articles");
        Ok(hits)
    }
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    let detail = body.chars().take(300).collect::<String>();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("Web of Science rejected the API key ({status}): {detail}")
        }
        StatusCode::TOO_MANY_REQUESTS => {
            format!("Web of Science quota exceeded ({status}): {detail}")
        }
        _ => format!("Web of Science API error ({status}): {detail}"),
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("hit is not a JSON object")]
    NotAnObject,
    #[error("field `{field}` is present but is not {expected}")]
    WrongType { field: &'static str, expected: &'static str },
}

/// Map every hit in a documents response, skipping the ones that cannot be mapped.
pub fn map_hits(body: &Value) -> Vec<SearchHit> {
    let Some(hits) = body["hits"].as_array() else {
        warn!("Web of Science response has no `hits` array");
        return Vec::new();
    };

    hits.iter()
        .enumerate()
        .filter_map(|(index, hit)| match hit_to_search_hit(hit) {
            Ok(mapped) => {
                debug!(index, title = %mapped.title, "Mapped search hit");
                Some(mapped)
            }
            Err(e) => {
                warn!(index, error = %e, "Skipping unmappable search hit");
                None
            }
        })
        .collect()
}

pub fn hit_to_search_hit(hit: &Value) -> Result<SearchHit, MappingError> {
    if !hit.is_object() {
        return Err(MappingError::NotAnObject);
    }

    let title = string_at(hit, "/title", "title")?.unwrap_or_default();
    let doi = string_at(hit, "/identifiers/doi", "identifiers.doi")?
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let source = string_at(hit, "/source/sourceTitle", "source.sourceTitle")?.unwrap_or_default();

    let publication_date = match present(hit, "/source/publishYear") {
        None => String::new(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(MappingError::WrongType {
                field: "source.publishYear",
                expected: "a number or string",
            })
        }
    };

    let authors = match present(hit, "/names/authors") {
        None => Vec::new(),
        Some(Value::Array(list)) => list.iter().filter_map(author_name).collect(),
        Some(_) => {
            return Err(MappingError::WrongType { field: "names.authors", expected: "an array" })
        }
    };

    Ok(SearchHit { title, authors, doi, publication_date, source })
}

/// `None` for both absent and explicit `null`.
fn present<'a>(hit: &'a Value, pointer: &str) -> Option<&'a Value> {
    hit.pointer(pointer).filter(|v| !v.is_null())
}

fn string_at(
    hit: &Value,
    pointer: &str,
    field: &'static str,
) -> Result<Option<String>, MappingError> {
    match present(hit, pointer) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(MappingError::WrongType { field, expected: "a string" }),
    }
}

fn author_name(author: &Value) -> Option<String> {
    author["displayName"]
        .as_str()
        .or_else(|| author["wosStandard"].as_str())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
}
