//! Read-only GitHub REST client backing the repository tools.
//!
//! Responses are trimmed to the fields the evaluator needs so tool output
//! stays small in the model's context.

use crate::agent::tools::ToolError;
use crate::credentials::Secret;
use serde_json::{json, Value};
use tracing::debug;

const USER_AGENT: &str = concat!("candilyzer/", env!("CARGO_PKG_VERSION"));

pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: Secret,
    max_items: usize,
}

impl GithubClient {
    pub fn new(http: reqwest::Client, api_url: &str, token: Secret, max_items: usize) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            max_items: max_items.clamp(1, 100),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ToolError> {
        let url = format!("{}{}", self.api_url, path);
        debug!("GitHub GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(self.token.expose())
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(String::from))
                .unwrap_or(body);
            return Err(ToolError::Api {
                service: "GitHub",
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    fn per_page(&self, limit: Option<u64>) -> String {
        limit
            .map(|l| (l as usize).clamp(1, self.max_items))
            .unwrap_or(self.max_items)
            .to_string()
    }

    /// Public profile of a user.
    pub async fn user_profile(&self, username: &str) -> Result<Value, ToolError> {
        let user = self.get(&format!("/users/{}", username), &[]).await?;
        Ok(pick(
            &user,
            &[
                "login",
                "name",
                "company",
                "blog",
                "location",
                "bio",
                "hireable",
                "public_repos",
                "public_gists",
                "followers",
                "following",
                "created_at",
                "updated_at",
                "html_url",
            ],
        ))
    }

    /// Repositories owned by a user, most recently pushed first.
    pub async fn user_repositories(
        &self,
        username: &str,
        limit: Option<u64>,
    ) -> Result<Value, ToolError> {
        let repos = self
            .get(
                &format!("/users/{}/repos", username),
                &[
                    ("sort", "pushed".to_string()),
                    ("type", "owner".to_string()),
                    ("per_page", self.per_page(limit)),
                ],
            )
            .await?;
        Ok(map_array(&repos, summarize_repository))
    }

    /// Details of one repository.
    pub async fn repository(&self, full_name: &str) -> Result<Value, ToolError> {
        let full_name = check_full_name(full_name)?;
        let repo = self.get(&format!("/repos/{}", full_name), &[]).await?;
        let mut details = summarize_repository(&repo);
        if let Some(obj) = details.as_object_mut() {
            for key in ["default_branch", "has_issues", "has_wiki", "homepage", "size", "subscribers_count", "created_at"] {
                obj.insert(key.to_string(), repo[key].clone());
            }
            obj.insert("license".to_string(), repo["license"]["spdx_id"].clone());
            obj.insert("parent".to_string(), repo["parent"]["full_name"].clone());
        }
        Ok(details)
    }

    /// Bytes of code per language.
    pub async fn repository_languages(&self, full_name: &str) -> Result<Value, ToolError> {
        let full_name = check_full_name(full_name)?;
        self.get(&format!("/repos/{}/languages", full_name), &[]).await
    }

    /// Recent commits, optionally filtered by author login and ISO-8601 date.
    pub async fn repository_commits(
        &self,
        full_name: &str,
        author: Option<&str>,
        since: Option<&str>,
        limit: Option<u64>,
    ) -> Result<Value, ToolError> {
        let full_name = check_full_name(full_name)?;
        let mut query = vec![("per_page", self.per_page(limit))];
        if let Some(author) = author {
            query.push(("author", author.to_string()));
        }
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }

        let commits = self
            .get(&format!("/repos/{}/commits", full_name), &query)
            .await?;
        Ok(map_array(&commits, |c| {
            let sha = c["sha"].as_str().unwrap_or_default();
            let message = c["commit"]["message"]
                .as_str()
                .and_then(|m| m.lines().next())
                .unwrap_or_default();
            json!({
                "sha": &sha[..sha.len().min(7)],
                "message": message,
                "author": c["author"]["login"].clone(),
                "date": c["commit"]["author"]["date"].clone(),
            })
        }))
    }

    /// Recent public events (pushes, pull requests, reviews, issues).
    pub async fn user_activity(&self, username: &str, limit: Option<u64>) -> Result<Value, ToolError> {
        let events = self
            .get(
                &format!("/users/{}/events/public", username),
                &[("per_page", self.per_page(limit))],
            )
            .await?;
        Ok(map_array(&events, |e| {
            let payload = &e["payload"];
            json!({
                "type": e["type"].clone(),
                "repo": e["repo"]["name"].clone(),
                "created_at": e["created_at"].clone(),
                "action": payload["action"].clone(),
                "commits": payload["commits"].as_array().map(|c| c.len()),
                "title": payload["pull_request"]["title"]
                    .as_str()
                    .or_else(|| payload["issue"]["title"].as_str()),
            })
        }))
    }

    /// Repository search using GitHub's query syntax.
    pub async fn search_repositories(&self, query: &str, limit: Option<u64>) -> Result<Value, ToolError> {
        let results = self
            .get(
                "/search/repositories",
                &[("q", query.to_string()), ("per_page", self.per_page(limit))],
            )
            .await?;
        Ok(json!({
            "total_count": results["total_count"].clone(),
            "items": map_array(&results["items"], summarize_repository),
        }))
    }
}

fn check_full_name(full_name: &str) -> Result<&str, ToolError> {
    let full_name = full_name.trim().trim_matches('/');
    match full_name.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok(full_name)
        }
        _ => Err(ToolError::InvalidArgument(format!(
            "repository must be 'owner/name', got '{}'",
            full_name
        ))),
    }
}

fn pick(value: &Value, keys: &[&str]) -> Value {
    let mut out = serde_json::Map::new();
    for key in keys {
        if let Some(v) = value.get(*key) {
            out.insert((*key).to_string(), v.clone());
        }
    }
    Value::Object(out)
}

fn map_array(value: &Value, f: impl Fn(&Value) -> Value) -> Value {
    Value::Array(
        value
            .as_array()
            .map(|items| items.iter().map(f).collect())
            .unwrap_or_default(),
    )
}

fn summarize_repository(repo: &Value) -> Value {
    pick(
        repo,
        &[
            "full_name",
            "description",
            "fork",
            "archived",
            "language",
            "topics",
            "stargazers_count",
            "forks_count",
            "watchers_count",
            "open_issues_count",
            "pushed_at",
            "updated_at",
            "html_url",
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };

    async fn spawn_fake_github() -> String {
        async fn user(
            Path(name): Path<String>,
            headers: HeaderMap,
        ) -> Result<Json<Value>, StatusCode> {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer ghp_test");
            if !authorized {
                return Err(StatusCode::UNAUTHORIZED);
            }
            Ok(Json(json!({
                "login": name,
                "followers": 42,
                "node_id": "dropped",
            })))
        }

        async fn repos() -> Json<Value> {
            Json(json!([
                {"full_name": "alice/engine", "fork": false, "stargazers_count": 120, "owner": {"login": "alice"}},
                {"full_name": "alice/tutorial", "fork": true, "stargazers_count": 0, "owner": {"login": "alice"}}
            ]))
        }

        let app = Router::new()
            .route("/users/:name", get(user))
            .route("/users/:name/repos", get(repos));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_check_full_name() {
        assert_eq!(check_full_name(" alice/engine ").unwrap(), "alice/engine");
        assert!(check_full_name("alice").is_err());
        assert!(check_full_name("alice/engine/extra").is_err());
        assert!(check_full_name("/engine").is_err());
    }

    #[test]
    fn test_summarize_repository_drops_noise() {
        let repo = json!({"full_name": "a/b", "stargazers_count": 3, "owner": {"login": "a"}});
        let summary = summarize_repository(&repo);
        assert_eq!(summary["full_name"], "a/b");
        assert!(summary.get("owner").is_none());
    }

    #[tokio::test]
    async fn test_user_profile_and_repositories() {
        let base = spawn_fake_github().await;
        let client = GithubClient::new(reqwest::Client::new(), &base, Secret::new("ghp_test"), 30);

        let profile = client.user_profile("alice").await.unwrap();
        assert_eq!(profile["login"], "alice");
        assert_eq!(profile["followers"], 42);
        assert!(profile.get("node_id").is_none());

        let repos = client.user_repositories("alice", Some(5)).await.unwrap();
        let repos = repos.as_array().unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[1]["fork"], true);
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let base = spawn_fake_github().await;
        let client = GithubClient::new(reqwest::Client::new(), &base, Secret::new("ghp_test"), 30);

        let err = client.repository_languages("alice/missing").await.unwrap_err();
        match err {
            ToolError::Api { service, status, .. } => {
                assert_eq!(service, "GitHub");
                assert_eq!(status, 404);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
