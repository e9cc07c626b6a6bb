//! Data models for the candidate analyzer.
//!
//! This module contains the data structures shared between the agent,
//! the orchestration layer and the two front-ends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which analysis flow a submission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    /// Several GitHub usernames ranked against one role.
    Multi,
    /// One candidate, optionally with a LinkedIn profile.
    Single,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Multi => write!(f, "Multi-Candidate Analyzer"),
            AnalysisKind::Single => write!(f, "Single Candidate Analyzer"),
        }
    }
}

/// One item produced by the agent while it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// A fragment of the model's answer text.
    Content(String),
    /// The model asked for a tool. Shown as a status line, never appended
    /// to the answer buffer.
    ToolCall { name: String, arguments: String },
}

/// What the front-ends draw, in the order they must draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisUpdate {
    /// The agent invoked a tool.
    Tool { name: String, arguments: String },
    /// Text appended to the buffer at `offset` (the previous buffer length,
    /// in bytes).
    Fragment { offset: usize, text: String },
    /// Stream completed; the buffer is final.
    Finished(AnalysisOutcome),
    /// External call failed. The buffer is incomplete and no score is derived.
    Failed { message: String },
}

impl AnalysisUpdate {
    /// SSE event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            AnalysisUpdate::Tool { .. } => "tool",
            AnalysisUpdate::Fragment { .. } => "fragment",
            AnalysisUpdate::Finished(_) => "done",
            AnalysisUpdate::Failed { .. } => "error",
        }
    }
}

/// The completed result of one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    /// Full accumulated answer text.
    pub text: String,
    /// First `NN/100` found in `text`, if any.
    pub score: Option<u32>,
    /// Number of fragments appended.
    pub fragments: usize,
    /// Number of tool calls the agent made.
    pub tool_calls: usize,
    /// Wall-clock duration of the stream.
    pub duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_serialization_is_tagged() {
        let update = AnalysisUpdate::Fragment {
            offset: 5,
            text: "hello".to_string(),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["type"], "fragment");
        assert_eq!(json["offset"], 5);
        assert_eq!(json["text"], "hello");
        assert_eq!(update.event_name(), "fragment");
    }

    #[test]
    fn test_finished_carries_outcome_fields() {
        let update = AnalysisUpdate::Finished(AnalysisOutcome {
            text: "Score: 82/100".to_string(),
            score: Some(82),
            fragments: 2,
            tool_calls: 1,
            duration_seconds: 1.5,
        });
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["type"], "finished");
        assert_eq!(json["score"], 82);
        assert_eq!(update.event_name(), "done");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(AnalysisKind::Multi.to_string(), "Multi-Candidate Analyzer");
        assert_eq!(AnalysisKind::Single.to_string(), "Single Candidate Analyzer");
    }
}
