use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::WatchError;

/// Crossref asks polite clients to identify themselves with a contact address.
pub const USER_AGENT: &str = concat!(
    "scholarwatch/",
    env!("CARGO_PKG_VERSION"),
    " (mailto:scholarwatch@example.com)"
);

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP client that only talks to approved hosts.
///
/// Every outbound request of the digest pipeline goes through this type, so the
/// set of services a run can reach is the allowlist below plus whatever the
/// caller explicitly adds with [`SandboxClient::allow_domain`].
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist of literature and LLM hosts.
    pub fn new() -> Result<Self, WatchError> {
        let domains = [
            "api.clarivate.com",     // Web of Science Starter
            "api.crossref.org",      // Crossref
            "www.ncbi.nlm.nih.gov",  // PMC ID converter + article pages
            "pmc.ncbi.nlm.nih.gov",  // PMC article pages (new host)
            "api.openai.com",        // OpenAI
            "localhost",             // Ollama local
            "127.0.0.1",             // Localhost alt
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(WatchError::Http)?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        // Exact match or subdomain of an allowed domain
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, WatchError> {
        self.check(url)?;
        Ok(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, WatchError> {
        self.check(url)?;
        Ok(self.client.post(url))
    }

    fn check(&self, url: &str) -> Result<(), WatchError> {
        if self.is_allowed(url) {
            Ok(())
        } else {
            Err(WatchError::SecurityError(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist() {
        let client = SandboxClient::new().unwrap();
        assert!(client.is_allowed("https://api.crossref.org/works/10.1000/x"));
        assert!(client.is_allowed("http://localhost:11434/api/chat"));
        assert!(client.is_allowed("http://127.0.0.1:8080/documents"));
        assert!(!client.is_allowed("https://example.com/"));
        assert!(!client.is_allowed("not a url"));
    }

    #[test]
    fn test_subdomain_is_allowed() {
        let client = SandboxClient::new().unwrap();
        assert!(client.is_allowed("https://eu.api.openai.com/v1"));
        assert!(!client.is_allowed("https://evilapi.openai.com.attacker.net/"));
    }

    #[test]
    fn test_blocked_request_is_security_error() {
        let mut client = SandboxClient::new().unwrap();
        assert!(matches!(client.get("https://example.org/"), Err(WatchError::SecurityError(_))));
        client.allow_domain("example.org");
        assert!(client.get("https://example.org/").is_ok());
    }
}
