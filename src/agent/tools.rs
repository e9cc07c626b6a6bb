//! Tool definitions for the candidate evaluation agent.
//!
//! This module defines the tools the model may call while it reasons:
//! GitHub introspection, domain-restricted web search, a thinking
//! scratchpad and structured reasoning steps.

use crate::agent::github::GithubClient;
use crate::agent::llm::ToolCallMessage;
use crate::agent::search::SearchClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Largest tool output handed back to the model, in characters.
const MAX_TOOL_OUTPUT_CHARS: usize = 20_000;

/// Tool definition for the chat-completion tool-calling API.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    fn function(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// Failure of a GitHub or search call. Reported back to the model as tool
/// output; it never aborts the analysis.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message),
        }
    }

    /// Text for the `tool` message in the chat history.
    pub fn into_message_content(self) -> String {
        let text = if self.success {
            self.output
        } else {
            format!("Error: {}", self.error.unwrap_or_default())
        };
        truncate_output(text)
    }

    fn from_json(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(value) => match serde_json::to_string(&value) {
                Ok(text) => ToolResult::success(text),
                Err(e) => ToolResult::error(e.to_string()),
            },
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Which helper tools a flow declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolkit {
    /// Enables `think`. The string is extra guidance for the system prompt
    /// (may be empty).
    pub thinking: Option<String>,
    /// Enables `reason` and `analyze`.
    pub reasoning: bool,
}

/// A structured step recorded by `reason` or `analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub kind: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
    pub confidence: f64,
}

/// The tools executor that handles tool calls.
pub struct ToolExecutor {
    github: GithubClient,
    search: SearchClient,
    toolkit: Toolkit,
    /// Scratchpad entries from `think`.
    thoughts: Vec<String>,
    /// Steps from `reason` / `analyze`.
    steps: Vec<ReasoningStep>,
}

impl ToolExecutor {
    pub fn new(github: GithubClient, search: SearchClient, toolkit: Toolkit) -> Self {
        Self {
            github,
            search,
            toolkit,
            thoughts: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Tools declared to the model for this flow.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let domains = self.search.settings().include_domains.join(", ");
        get_tool_definitions(&self.toolkit, &domains)
    }

    /// Execute a tool call and return the result.
    pub async fn execute(&mut self, tool_call: &ToolCallMessage) -> ToolResult {
        let name = tool_call.function.name.as_str();

        let args: Value = match serde_json::from_str(&tool_call.function.arguments) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(_) | Err(_) => {
                warn!("Tool {} called with malformed arguments", name);
                return ToolResult::error(format!(
                    "Arguments for {} must be a JSON object",
                    name
                ));
            }
        };

        debug!("Executing tool: {} with args: {}", name, args);

        match name {
            "get_user_profile" => match required_str(&args, "username") {
                Ok(username) => ToolResult::from_json(self.github.user_profile(username).await),
                Err(e) => e,
            },
            "list_user_repositories" => match required_str(&args, "username") {
                Ok(username) => ToolResult::from_json(
                    self.github
                        .user_repositories(username, args["limit"].as_u64())
                        .await,
                ),
                Err(e) => e,
            },
            "get_repository" => match required_str(&args, "repository") {
                Ok(repo) => ToolResult::from_json(self.github.repository(repo).await),
                Err(e) => e,
            },
            "get_repository_languages" => match required_str(&args, "repository") {
                Ok(repo) => ToolResult::from_json(self.github.repository_languages(repo).await),
                Err(e) => e,
            },
            "list_repository_commits" => match required_str(&args, "repository") {
                Ok(repo) => ToolResult::from_json(
                    self.github
                        .repository_commits(
                            repo,
                            args["author"].as_str(),
                            args["since"].as_str(),
                            args["limit"].as_u64(),
                        )
                        .await,
                ),
                Err(e) => e,
            },
            "list_user_activity" => match required_str(&args, "username") {
                Ok(username) => ToolResult::from_json(
                    self.github
                        .user_activity(username, args["limit"].as_u64())
                        .await,
                ),
                Err(e) => e,
            },
            "search_repositories" => match required_str(&args, "query") {
                Ok(query) => ToolResult::from_json(
                    self.github
                        .search_repositories(query, args["limit"].as_u64())
                        .await,
                ),
                Err(e) => e,
            },
            "search_web" => match required_str(&args, "query") {
                Ok(query) => ToolResult::from_json(
                    self.search
                        .search(query, args["num_results"].as_u64())
                        .await
                        .map(|hits| json!(hits)),
                ),
                Err(e) => e,
            },
            "think" if self.toolkit.thinking.is_some() => self.think(&args),
            "reason" if self.toolkit.reasoning => self.reason(&args),
            "analyze" if self.toolkit.reasoning => self.analyze(&args),
            _ => ToolResult::error(format!("Unknown tool: {}", name)),
        }
    }

    /// Append to the scratchpad and echo it back.
    fn think(&mut self, args: &Value) -> ToolResult {
        let thought = match required_str(args, "thought") {
            Ok(t) => t,
            Err(e) => return e,
        };
        self.thoughts.push(thought.to_string());

        let mut output = String::from("Thoughts:\n");
        for (i, t) in self.thoughts.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, t));
        }
        ToolResult::success(output)
    }

    fn reason(&mut self, args: &Value) -> ToolResult {
        let (title, thought) = match (required_str(args, "title"), required_str(args, "thought")) {
            (Ok(title), Ok(thought)) => (title, thought),
            (Err(e), _) | (_, Err(e)) => return e,
        };
        let mut body = thought.to_string();
        if let Some(action) = args["action"].as_str() {
            body.push_str(&format!("\nAction: {}", action));
        }
        self.record_step("reason", title, body, None, args)
    }

    fn analyze(&mut self, args: &Value) -> ToolResult {
        let (title, result, analysis) = match (
            required_str(args, "title"),
            required_str(args, "result"),
            required_str(args, "analysis"),
        ) {
            (Ok(title), Ok(result), Ok(analysis)) => (title, result, analysis),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
        };
        let next_action = args["next_action"]
            .as_str()
            .unwrap_or("continue")
            .to_string();
        let body = format!("Result: {}\nAnalysis: {}", result, analysis);
        self.record_step("analyze", title, body, Some(next_action), args)
    }

    fn record_step(
        &mut self,
        kind: &str,
        title: &str,
        body: String,
        next_action: Option<String>,
        args: &Value,
    ) -> ToolResult {
        let confidence = args["confidence"].as_f64().unwrap_or(0.8).clamp(0.0, 1.0);
        self.steps.push(ReasoningStep {
            kind: kind.to_string(),
            title: title.to_string(),
            body,
            next_action,
            confidence,
        });

        let mut output = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            output.push_str(&format!(
                "Step {} [{}] {} (confidence {:.2})\n{}\n",
                i + 1,
                step.kind,
                step.title,
                step.confidence,
                step.body
            ));
            if let Some(ref next) = step.next_action {
                output.push_str(&format!("Next: {}\n", next));
            }
        }
        ToolResult::success(output)
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolResult> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ToolResult::error(format!("Missing required parameter: {}", key)))
}

fn truncate_output(text: String) -> String {
    match text.char_indices().nth(MAX_TOOL_OUTPUT_CHARS) {
        Some((idx, _)) => format!(
            "{}... [truncated, showing first {} chars]",
            &text[..idx],
            MAX_TOOL_OUTPUT_CHARS
        ),
        None => text,
    }
}

/// Get the tool definitions for a flow. `domains` is only used to describe
/// the search restriction to the model.
pub fn get_tool_definitions(toolkit: &Toolkit, domains: &str) -> Vec<ToolDefinition> {
    let limit = json!({
        "type": "integer",
        "description": "Maximum number of items to return"
    });

    let mut tools = vec![
        ToolDefinition::function(
            "get_user_profile",
            "Get a GitHub user's public profile: name, bio, company, followers, public repository count, account age.",
            json!({
                "type": "object",
                "properties": {
                    "username": {"type": "string", "description": "GitHub username"}
                },
                "required": ["username"]
            }),
        ),
        ToolDefinition::function(
            "list_user_repositories",
            "List repositories owned by a GitHub user, most recently pushed first, with language, stars, forks and fork status.",
            json!({
                "type": "object",
                "properties": {
                    "username": {"type": "string", "description": "GitHub username"},
                    "limit": limit
                },
                "required": ["username"]
            }),
        ),
        ToolDefinition::function(
            "get_repository",
            "Get details of one repository: description, license, topics, stars, forks, parent if it is a fork.",
            json!({
                "type": "object",
                "properties": {
                    "repository": {"type": "string", "description": "Repository as 'owner/name'"}
                },
                "required": ["repository"]
            }),
        ),
        ToolDefinition::function(
            "get_repository_languages",
            "Get the languages used in a repository with bytes of code per language.",
            json!({
                "type": "object",
                "properties": {
                    "repository": {"type": "string", "description": "Repository as 'owner/name'"}
                },
                "required": ["repository"]
            }),
        ),
        ToolDefinition::function(
            "list_repository_commits",
            "List recent commits of a repository, optionally filtered by author and start date.",
            json!({
                "type": "object",
                "properties": {
                    "repository": {"type": "string", "description": "Repository as 'owner/name'"},
                    "author": {"type": "string", "description": "GitHub login of the commit author"},
                    "since": {"type": "string", "description": "ISO 8601 timestamp, only commits after this date"},
                    "limit": limit
                },
                "required": ["repository"]
            }),
        ),
        ToolDefinition::function(
            "list_user_activity",
            "List a GitHub user's recent public activity: pushes, pull requests, reviews, issues.",
            json!({
                "type": "object",
                "properties": {
                    "username": {"type": "string", "description": "GitHub username"},
                    "limit": limit
                },
                "required": ["username"]
            }),
        ),
        ToolDefinition::function(
            "search_repositories",
            "Search GitHub repositories using GitHub search syntax, e.g. 'user:alice language:rust'.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "GitHub search query"},
                    "limit": limit
                },
                "required": ["query"]
            }),
        ),
        ToolDefinition::function(
            "search_web",
            &format!(
                "Keyword web search for public profiles and posts. Results are restricted to: {}.",
                if domains.is_empty() { "any domain" } else { domains }
            ),
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"},
                    "num_results": {"type": "integer", "description": "Number of results"}
                },
                "required": ["query"]
            }),
        ),
    ];

    if toolkit.thinking.is_some() {
        tools.push(ToolDefinition::function(
            "think",
            "Use as a scratchpad to reason about the evidence gathered so far. Does not fetch new information.",
            json!({
                "type": "object",
                "properties": {
                    "thought": {"type": "string", "description": "Your thought"}
                },
                "required": ["thought"]
            }),
        ));
    }

    if toolkit.reasoning {
        tools.push(ToolDefinition::function(
            "reason",
            "Plan the next reasoning step before acting.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Short title of the step"},
                    "thought": {"type": "string", "description": "Your reasoning"},
                    "action": {"type": "string", "description": "What you will do next"},
                    "confidence": {"type": "number", "description": "Confidence between 0 and 1"}
                },
                "required": ["title", "thought"]
            }),
        ));
        tools.push(ToolDefinition::function(
            "analyze",
            "Evaluate the result of the previous step and decide whether to continue, validate or answer.",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Short title of the step"},
                    "result": {"type": "string", "description": "Outcome of the previous action"},
                    "analysis": {"type": "string", "description": "Your analysis of the outcome"},
                    "next_action": {
                        "type": "string",
                        "enum": ["continue", "validate", "final_answer"],
                        "description": "What to do next"
                    },
                    "confidence": {"type": "number", "description": "Confidence between 0 and 1"}
                },
                "required": ["title", "result", "analysis"]
            }),
        ));
    }

    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::ToolCallFunction;
    use crate::agent::search::SearchSettings;
    use crate::credentials::Secret;

    fn executor(toolkit: Toolkit) -> ToolExecutor {
        let http = reqwest::Client::new();
        ToolExecutor::new(
            GithubClient::new(http.clone(), "http://127.0.0.1:9", Secret::new("gh"), 30),
            SearchClient::new(
                http,
                "http://127.0.0.1:9",
                Secret::new("exa"),
                SearchSettings {
                    include_domains: vec!["github.com".to_string()],
                    search_type: "keyword".to_string(),
                    num_results: 5,
                    text_length_limit: None,
                },
            ),
            toolkit,
        )
    }

    fn call(name: &str, arguments: &str) -> ToolCallMessage {
        ToolCallMessage {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: ToolCallFunction {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    fn full_toolkit() -> Toolkit {
        Toolkit {
            thinking: Some(String::new()),
            reasoning: true,
        }
    }

    #[test]
    fn test_tool_definitions() {
        let tools = get_tool_definitions(&full_toolkit(), "github.com");
        let names: Vec<_> = tools.iter().map(|t| t.function.name.as_str()).collect();
        assert_eq!(tools.len(), 11);
        assert!(names.contains(&"list_user_repositories"));
        assert!(names.contains(&"search_web"));
        assert!(names.contains(&"think"));
        assert!(names.contains(&"analyze"));

        let search = tools.iter().find(|t| t.function.name == "search_web").unwrap();
        assert!(search.function.description.contains("github.com"));

        let bare = get_tool_definitions(
            &Toolkit {
                thinking: None,
                reasoning: false,
            },
            "",
        );
        assert_eq!(bare.len(), 8);
    }

    #[tokio::test]
    async fn test_think_accumulates() {
        let mut executor = executor(full_toolkit());
        executor.execute(&call("think", r#"{"thought":"check forks"}"#)).await;
        let result = executor
            .execute(&call("think", r#"{"thought":"compare activity"}"#))
            .await;
        assert!(result.success);
        assert!(result.output.contains("1. check forks"));
        assert!(result.output.contains("2. compare activity"));
    }

    #[tokio::test]
    async fn test_reasoning_steps() {
        let mut executor = executor(full_toolkit());
        executor
            .execute(&call("reason", r#"{"title":"Plan","thought":"list repos","confidence":0.9}"#))
            .await;
        let result = executor
            .execute(&call(
                "analyze",
                r#"{"title":"Repos","result":"3 originals","analysis":"solid","next_action":"final_answer"}"#,
            ))
            .await;
        assert!(result.success);
        assert!(result.output.contains("Step 1 [reason] Plan (confidence 0.90)"));
        assert!(result.output.contains("Next: final_answer"));
    }

    #[tokio::test]
    async fn test_disabled_and_unknown_tools() {
        let mut executor = executor(Toolkit {
            thinking: None,
            reasoning: false,
        });
        let result = executor.execute(&call("think", r#"{"thought":"x"}"#)).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown tool: think"));
    }

    #[tokio::test]
    async fn test_argument_validation() {
        let mut executor = executor(full_toolkit());
        let result = executor.execute(&call("get_user_profile", "{}")).await;
        assert_eq!(
            result.error.as_deref(),
            Some("Missing required parameter: username")
        );

        let result = executor.execute(&call("get_repository", "not json")).await;
        assert!(!result.success);

        let result = executor
            .execute(&call("get_repository", r#"{"repository":"no-slash"}"#))
            .await;
        assert!(result.error.unwrap().contains("owner/name"));
    }

    #[test]
    fn test_message_content_truncated() {
        let long = "x".repeat(MAX_TOOL_OUTPUT_CHARS + 10);
        let content = ToolResult::success(long).into_message_content();
        assert!(content.ends_with("[truncated, showing first 20000 chars]"));

        let content = ToolResult::error("boom".to_string()).into_message_content();
        assert_eq!(content, "Error: boom");
    }
}
