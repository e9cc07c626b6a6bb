//! Agent loop for tool-based candidate evaluation.
//!
//! Each invocation streams one chat completion at a time. Text deltas are
//! forwarded as soon as they arrive; when a turn ends in tool calls the
//! tools are executed, their output is appended to the history and the
//! model is asked again, until it answers without tools.

use crate::agent::github::GithubClient;
use crate::agent::llm::{AssistantTurn, ChatClient, ChatMessage, ChatRequest};
use crate::agent::search::{SearchClient, SearchSettings};
use crate::agent::tools::{ToolExecutor, Toolkit};
use crate::analysis::{FragmentSource, Invocation};
use crate::config::Config;
use crate::errors::AnalysisError;
use crate::models::{AgentEvent, AnalysisKind};
use crate::prompts;
use chrono::Utc;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-flow agent setup.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub name: String,
    pub model: String,
    /// Enables the `think` tool; the string is an extra instruction for it.
    pub thinking: Option<String>,
    pub reasoning: bool,
    pub search: SearchSettings,
    /// Append the current date and time to the system prompt.
    pub add_datetime: bool,
}

impl AgentProfile {
    fn toolkit(&self) -> Toolkit {
        Toolkit {
            thinking: self.thinking.clone(),
            reasoning: self.reasoning,
        }
    }

    fn system_prompt(&self, kind: AnalysisKind) -> String {
        prompts::system_prompt(
            kind,
            self.thinking.as_deref(),
            self.reasoning,
            self.add_datetime.then(Utc::now),
        )
    }
}

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub base_url: String,
    pub temperature: Option<f32>,
    pub connect_timeout_seconds: u64,
    pub max_tool_rounds: usize,
    pub github_api_url: String,
    pub github_max_items: usize,
    pub search_api_url: String,
    pub multi: AgentProfile,
    pub single: AgentProfile,
}

impl AgentConfig {
    pub fn from_config(config: &Config) -> Self {
        let search = &config.search;
        Self {
            base_url: config.model.base_url.clone(),
            temperature: config.model.temperature,
            connect_timeout_seconds: config.model.connect_timeout_seconds,
            max_tool_rounds: config.model.max_tool_rounds,
            github_api_url: config.github.api_url.clone(),
            github_max_items: config.github.max_items,
            search_api_url: search.api_url.clone(),
            multi: AgentProfile {
                name: "StrictCandidateEvaluator".to_string(),
                model: config.model.multi_model.clone(),
                thinking: Some("Analyze GitHub candidates with strict criteria".to_string()),
                reasoning: true,
                search: SearchSettings {
                    include_domains: search.multi_domains.clone(),
                    search_type: search.search_type.clone(),
                    num_results: search.num_results,
                    text_length_limit: None,
                },
                add_datetime: false,
            },
            single: AgentProfile {
                name: "Candilyzer".to_string(),
                model: config.model.single_model.clone(),
                thinking: Some(String::new()),
                reasoning: true,
                search: SearchSettings {
                    include_domains: search.single_domains.clone(),
                    search_type: search.search_type.clone(),
                    num_results: search.num_results,
                    text_length_limit: Some(search.single_text_length_limit),
                },
                add_datetime: true,
            },
        }
    }

    pub fn profile(&self, kind: AnalysisKind) -> &AgentProfile {
        match kind {
            AnalysisKind::Multi => &self.multi,
            AnalysisKind::Single => &self.single,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The candidate evaluation agent. Holds no credentials; every invocation
/// brings its own.
pub struct CandidateAgent {
    config: Arc<AgentConfig>,
    http: reqwest::Client,
}

impl CandidateAgent {
    pub fn new(config: AgentConfig) -> Result<Self, AnalysisError> {
        info!(
            "Initializing agent with models {} / {} at {}",
            config.multi.model, config.single.model, config.base_url
        );

        // Streams may run for minutes; only connecting is bounded.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()
            .map_err(AnalysisError::Client)?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }
}

impl FragmentSource for CandidateAgent {
    fn invoke(&self, invocation: Invocation) -> BoxStream<'static, Result<AgentEvent, AnalysisError>> {
        run(Arc::clone(&self.config), self.http.clone(), invocation).boxed()
    }
}

fn run(
    config: Arc<AgentConfig>,
    http: reqwest::Client,
    invocation: Invocation,
) -> impl Stream<Item = Result<AgentEvent, AnalysisError>> + Send + 'static {
    async_stream::try_stream! {
        let Invocation { kind, query, context } = invocation;
        let profile = config.profile(kind).clone();
        info!("Agent {} starting with model {}", profile.name, profile.model);

        let chat = ChatClient::new(http.clone(), &config.base_url, context.model_api_key().clone());
        let mut executor = ToolExecutor::new(
            GithubClient::new(
                http.clone(),
                &config.github_api_url,
                context.github_token().clone(),
                config.github_max_items,
            ),
            SearchClient::new(
                http,
                &config.search_api_url,
                context.search_api_key().clone(),
                profile.search.clone(),
            ),
            profile.toolkit(),
        );
        let tools = executor.definitions();

        let mut messages = vec![
            ChatMessage::system(profile.system_prompt(kind)),
            ChatMessage::user(query),
        ];
        let mut rounds = 0;

        loop {
            let mut deltas = {
                let request = ChatRequest {
                    model: &profile.model,
                    messages: &messages,
                    tools: &tools,
                    temperature: config.temperature,
                    stream: true,
                };
                chat.stream_chat(&request).await?
            };

            let mut turn = AssistantTurn::default();
            while let Some(delta) = deltas.next().await {
                if let Some(text) = turn.absorb(delta?) {
                    yield AgentEvent::Content(text);
                }
            }

            if !turn.has_tool_calls() {
                break;
            }

            rounds += 1;
            if rounds > config.max_tool_rounds {
                warn!("Agent exceeded {} tool rounds", config.max_tool_rounds);
                Err::<(), _>(AnalysisError::ToolRoundsExceeded(config.max_tool_rounds))?;
            }

            let (message, calls) = turn.into_message();
            messages.push(message);
            debug!("Round {}: {} tool calls", rounds, calls.len());

            for call in calls {
                yield AgentEvent::ToolCall {
                    name: call.function.name.clone(),
                    arguments: call.function.arguments.clone(),
                };

                let result = executor.execute(&call).await;
                if let Some(ref error) = result.error {
                    warn!("Tool {} failed: {}", call.function.name, error);
                }
                messages.push(ChatMessage::tool(call.id, result.into_message_content()));
            }
        }

        info!("Agent {} finished after {} tool rounds", profile.name, rounds);
    }
}
