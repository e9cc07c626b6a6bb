//! LLM agent modules for candidate evaluation.
//!
//! This module provides the streaming chat client, the GitHub and web search
//! clients behind the agent's tools, and the tool-calling loop.

pub mod agent_loop;
pub mod github;
pub mod llm;
pub mod search;
pub mod tools;

pub use agent_loop::{AgentConfig, CandidateAgent};
