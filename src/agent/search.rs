//! Exa web search, restricted to a domain allow-list.

use crate::agent::tools::ToolError;
use crate::credentials::Secret;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Per-flow search settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Only results on these domains (or their subdomains) are returned.
    pub include_domains: Vec<String>,
    /// Exa search type, e.g. `keyword`.
    pub search_type: String,
    pub num_results: usize,
    /// Characters of page text per result. `None` returns no page text.
    pub text_length_limit: Option<usize>,
}

/// One search result as handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, rename = "publishedDate", skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

pub struct SearchClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Secret,
    settings: SearchSettings,
}

impl SearchClient {
    pub fn new(http: reqwest::Client, api_url: &str, api_key: Secret, settings: SearchSettings) -> Self {
        Self {
            http,
            endpoint: format!("{}/search", api_url.trim_end_matches('/')),
            api_key,
            settings,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn request_body(&self, query: &str, num_results: Option<u64>) -> Value {
        let num_results = num_results
            .map(|n| (n as usize).clamp(1, self.settings.num_results.max(1)))
            .unwrap_or(self.settings.num_results);

        let mut body = json!({
            "query": query,
            "type": self.settings.search_type,
            "numResults": num_results,
        });
        if !self.settings.include_domains.is_empty() {
            body["includeDomains"] = json!(self.settings.include_domains);
        }
        if let Some(limit) = self.settings.text_length_limit {
            body["contents"] = json!({ "text": { "maxCharacters": limit } });
        }
        body
    }

    /// Run a search. Results outside the allow-list are dropped even if the
    /// service returns them.
    pub async fn search(&self, query: &str, num_results: Option<u64>) -> Result<Vec<SearchHit>, ToolError> {
        debug!(
            "Exa search ({} domains): {}",
            self.settings.include_domains.len(),
            query
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", self.api_key.expose())
            .json(&self.request_body(query, num_results))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Api {
                service: "Exa",
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed
            .results
            .into_iter()
            .filter(|hit| domain_allowed(&hit.url, &self.settings.include_domains))
            .map(|mut hit| {
                if let (Some(text), Some(limit)) = (hit.text.as_mut(), self.settings.text_length_limit) {
                    truncate_chars(text, limit);
                }
                hit
            })
            .collect())
    }
}

/// True when `url`'s host is one of `domains` or a subdomain of one.
/// An empty allow-list allows everything.
pub fn domain_allowed(url: &str, domains: &[String]) -> bool {
    if domains.is_empty() {
        return true;
    }
    let Some(host) = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
    else {
        return false;
    };

    domains.iter().any(|domain| {
        let domain = domain.trim().trim_start_matches("www.").to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{}", domain))
    })
}

fn truncate_chars(text: &mut String, limit: usize) {
    if let Some((idx, _)) = text.char_indices().nth(limit) {
        text.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Json, Router};

    fn settings(domains: &[&str], limit: Option<usize>) -> SearchSettings {
        SearchSettings {
            include_domains: domains.iter().map(|d| d.to_string()).collect(),
            search_type: "keyword".to_string(),
            num_results: 5,
            text_length_limit: limit,
        }
    }

    #[test]
    fn test_domain_allowed() {
        let domains = vec!["linkedin.com".to_string(), "github.com".to_string()];
        assert!(domain_allowed("https://github.com/alice", &domains));
        assert!(domain_allowed("https://www.linkedin.com/in/alice", &domains));
        assert!(domain_allowed("https://gist.github.com/alice/1", &domains));
        assert!(!domain_allowed("https://notgithub.com/alice", &domains));
        assert!(!domain_allowed("https://github.com.evil.io/x", &domains));
        assert!(!domain_allowed("not a url", &domains));
        assert!(domain_allowed("https://example.com", &[]));
    }

    #[test]
    fn test_request_body() {
        let client = SearchClient::new(
            reqwest::Client::new(),
            "https://api.exa.ai/",
            Secret::new("exa"),
            settings(&["github.com"], Some(2000)),
        );
        let body = client.request_body("alice rust", Some(50));
        assert_eq!(body["type"], "keyword");
        assert_eq!(body["numResults"], 5);
        assert_eq!(body["includeDomains"], json!(["github.com"]));
        assert_eq!(body["contents"]["text"]["maxCharacters"], 2000);
        assert_eq!(client.endpoint, "https://api.exa.ai/search");

        let client = SearchClient::new(
            reqwest::Client::new(),
            "https://api.exa.ai",
            Secret::new("exa"),
            settings(&[], None),
        );
        let body = client.request_body("q", None);
        assert!(body.get("includeDomains").is_none());
        assert!(body.get("contents").is_none());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        let mut text = "héllo wörld".to_string();
        truncate_chars(&mut text, 4);
        assert_eq!(text, "héll");
    }

    #[tokio::test]
    async fn test_search_filters_foreign_domains() {
        async fn search(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            assert_eq!(headers.get("x-api-key").unwrap(), "exa-key");
            assert_eq!(body["includeDomains"], json!(["github.com"]));
            Json(json!({
                "results": [
                    {"url": "https://github.com/alice", "title": "alice", "text": "abcdefghij"},
                    {"url": "https://blog.example.com/alice", "title": "blog"}
                ]
            }))
        }

        let app = Router::new().route("/search", post(search));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = SearchClient::new(
            reqwest::Client::new(),
            &format!("http://{}", addr),
            Secret::new("exa-key"),
            settings(&["github.com"], Some(4)),
        );
        let hits = client.search("alice", None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://github.com/alice");
        assert_eq!(hits[0].text.as_deref(), Some("abcd"));
    }
}
