//! Streaming chat-completion client for DeepSeek's OpenAI-compatible API.
//!
//! Responses arrive as Server-Sent Events; each `data:` line carries one
//! JSON chunk with a `delta`. Text deltas are forwarded as they come,
//! tool-call deltas are stitched together by [`AssistantTurn`].

use crate::agent::tools::ToolDefinition;
use crate::credentials::Secret;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed stream chunk: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Chat role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message in the chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A complete tool call requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them.
    pub arguments: String,
}

/// Chat completion request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

/// Incremental piece of an assistant message.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCallDelta {
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// One decoded SSE line.
#[derive(Debug, PartialEq, Eq)]
pub enum SseLine {
    Data(String),
    Done,
    Skip,
}

/// Classify a single SSE line. Comments, blank lines and non-data fields are
/// skipped.
pub fn decode_sse_line(line: &[u8]) -> SseLine {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\r', '\n']);

    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();

    if data == "[DONE]" {
        SseLine::Done
    } else if data.is_empty() {
        SseLine::Skip
    } else {
        SseLine::Data(data.to_string())
    }
}

/// Split a byte stream into SSE `data:` payloads, ending at `[DONE]` or at
/// the end of the body.
fn sse_payloads<S>(inner: S) -> impl futures::Stream<Item = Result<String, LlmError>> + Send
where
    S: futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
{
    stream::unfold(
        (Box::pin(inner), Vec::<u8>::new(), false),
        |(mut inner, mut buf, finished)| async move {
            if finished {
                return None;
            }
            loop {
                if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    match decode_sse_line(&line) {
                        SseLine::Data(data) => return Some((Ok(data), (inner, buf, false))),
                        SseLine::Done => return None,
                        SseLine::Skip => continue,
                    }
                }

                match inner.next().await {
                    Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                    Some(Err(e)) => return Some((Err(LlmError::Http(e)), (inner, buf, true))),
                    None => {
                        // Flush a trailing line without a newline.
                        let rest = std::mem::take(&mut buf);
                        return match decode_sse_line(&rest) {
                            SseLine::Data(data) => Some((Ok(data), (inner, buf, true))),
                            _ => None,
                        };
                    }
                }
            }
        },
    )
}

/// Client for one model API key.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Secret,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Secret) -> Self {
        Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        }
    }

    /// Start a streamed completion. Resolves once the response headers are in;
    /// the returned stream yields deltas in arrival order.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest<'_>,
    ) -> Result<BoxStream<'static, Result<Delta, LlmError>>, LlmError> {
        debug!(
            "Sending chat request to {} with {} messages",
            self.endpoint,
            request.messages.len()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let deltas = sse_payloads(response.bytes_stream()).flat_map(|payload| {
            let deltas: Vec<Result<Delta, LlmError>> = match payload {
                Ok(data) => match serde_json::from_str::<StreamChunk>(&data) {
                    Ok(chunk) => chunk.choices.into_iter().map(|c| Ok(c.delta)).collect(),
                    Err(e) => vec![Err(LlmError::Parse(e))],
                },
                Err(e) => vec![Err(e)],
            };
            stream::iter(deltas)
        });

        Ok(deltas.boxed())
    }
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Accumulates the deltas of one assistant turn.
#[derive(Debug, Default)]
pub struct AssistantTurn {
    content: String,
    tool_calls: BTreeMap<usize, PartialToolCall>,
}

impl AssistantTurn {
    /// Fold a delta in. Returns the text it carried, if any.
    pub fn absorb(&mut self, delta: Delta) -> Option<String> {
        for call in delta.tool_calls.unwrap_or_default() {
            let entry = self.tool_calls.entry(call.index).or_default();
            if let Some(id) = call.id {
                entry.id = id;
            }
            if let Some(function) = call.function {
                if let Some(name) = function.name {
                    entry.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    entry.arguments.push_str(&arguments);
                }
            }
        }

        match delta.content {
            Some(text) if !text.is_empty() => {
                self.content.push_str(&text);
                Some(text)
            }
            _ => None,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The assistant message to append to history, plus its tool calls in
    /// index order.
    pub fn into_message(self) -> (ChatMessage, Vec<ToolCallMessage>) {
        let calls: Vec<ToolCallMessage> = self
            .tool_calls
            .into_iter()
            .map(|(index, call)| ToolCallMessage {
                id: if call.id.is_empty() {
                    format!("call_{}", index)
                } else {
                    call.id
                },
                call_type: "function".to_string(),
                function: ToolCallFunction {
                    name: call.name,
                    arguments: if call.arguments.trim().is_empty() {
                        "{}".to_string()
                    } else {
                        call.arguments
                    },
                },
            })
            .collect();

        let message = ChatMessage {
            role: Role::Assistant,
            content: Some(self.content),
            tool_calls: if calls.is_empty() {
                None
            } else {
                Some(calls.clone())
            },
            tool_call_id: None,
        };

        (message, calls)
    }
}
