//! Jira REST API client implementation

use crate::config::{AccountConfig, ProxyConfig};
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// One page of the issue search response.
///
/// Only the two fields the pagination loop relies on are modeled; the
/// server-reported `total` is deliberately ignored because it is absent or
/// unreliable for expensive searches. `maxResults` is required: without it
/// the offset cannot advance, so a response omitting it is malformed and
/// fatal to the pass.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    /// Issues on this page; an empty page terminates pagination
    #[serde(default)]
    pub issues: Vec<Value>,

    /// Server-declared page size, used to advance the offset
    #[serde(rename = "maxResults")]
    pub max_results: u64,
}

impl SearchPage {
    /// Check if this page is empty (pagination exhausted)
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

/// HTTP client for one Jira server, built once per pass
pub struct JiraClient {
    client: Client,
    base_url: Url,
    auth_header: String,
}

impl JiraClient {
    /// Build a client for the given account.
    ///
    /// The server value may carry an explicit scheme; without one, HTTPS is
    /// assumed. TLS verification and the outbound proxy follow the account
    /// and proxy configuration.
    pub fn new(account: &AccountConfig, proxy: Option<&ProxyConfig>) -> Result<Self> {
        let base_url = base_url_for(&account.server)?;

        let mut builder = Client::builder()
            .user_agent(format!("jira-collector/{}", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!account.verify_tls());

        debug!(verify = account.verify_tls(), "SSL certificate verification");

        if let Some(url) = proxy.and_then(ProxyConfig::effective_url) {
            debug!(proxy = url, "enabled proxy for HTTP requests");
            builder = builder.proxy(reqwest::Proxy::all(url)?);
        }

        let client = builder.build()?;

        let auth_header = format!(
            "Basic {}",
            BASE64.encode(format!("{}:{}", account.username, account.password))
        );

        Ok(Self {
            client,
            base_url,
            auth_header,
        })
    }

    /// Fetch one page of the issue search.
    ///
    /// `fields` and `expand` are transmitted as given; callers strip
    /// whitespace beforehand. A non-success status surfaces the response
    /// body as diagnostic context.
    pub async fn search(
        &self,
        jql: &str,
        fields: &str,
        expand: Option<&str>,
        start_at: u64,
    ) -> Result<SearchPage> {
        let url = self.endpoint("rest/api/2/search")?;
        let start_at_param = start_at.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("jql", jql),
            ("fields", fields),
            ("validateQuery", "true"),
            ("startAt", &start_at_param),
        ];
        if let Some(expand) = expand {
            params.push(("expand", expand));
        }

        let response = self
            .client
            .get(url)
            .query(&params)
            .header("Authorization", &self.auth_header)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::decode(format!(
                "Unable to parse Jira search response as JSON: {e}: text={body}"
            ))
        })
    }

    /// Fetch the complete worklog collection for a single issue.
    ///
    /// The endpoint does not support pagination, so the response always
    /// carries every worklog entry.
    pub async fn full_worklog(&self, issue_key: &str) -> Result<Value> {
        let url = self.endpoint(&format!("rest/api/2/issue/{issue_key}/worklog"))?;

        let response = self
            .client
            .get(url)
            .header("Authorization", &self.auth_header)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::http_status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::decode(format!(
                "Unable to parse Jira worklog response as JSON: {e}: text={body}"
            ))
        })
    }

    /// Resolve a path against the server base URL
    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Build the base URL for a configured server, defaulting to HTTPS
fn base_url_for(server: &str) -> Result<Url> {
    let server = server.trim().trim_end_matches('/');
    let with_scheme = if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("https://{server}")
    };
    // Trailing slash so Url::join treats the host as a directory
    Ok(Url::parse(&format!("{with_scheme}/"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_url_defaults_to_https() {
        assert_eq!(
            base_url_for("jira.example.com").unwrap().as_str(),
            "https://jira.example.com/"
        );
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        assert_eq!(
            base_url_for("http://127.0.0.1:8080").unwrap().as_str(),
            "http://127.0.0.1:8080/"
        );
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let url = base_url_for("jira.example.com/").unwrap();
        assert_eq!(
            url.join("rest/api/2/search").unwrap().as_str(),
            "https://jira.example.com/rest/api/2/search"
        );
    }

    #[test]
    fn test_search_page_deserialize() {
        let page: SearchPage =
            serde_json::from_str(r#"{"issues": [{"key": "A-1"}], "maxResults": 50}"#).unwrap();
        assert_eq!(page.issues.len(), 1);
        assert_eq!(page.max_results, 50);

        let page: SearchPage = serde_json::from_str(r#"{"issues": [], "maxResults": 50}"#).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_search_page_requires_max_results() {
        // Without maxResults the offset could never advance; treat the
        // response as malformed instead of looping at offset 0.
        let result = serde_json::from_str::<SearchPage>(r#"{"issues": [{"key": "A-1"}]}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<SearchPage>("{}");
        assert!(result.is_err());
    }
}
