//! Analysis orchestration.
//!
//! A submission is validated, handed to a [`FragmentSource`] and the
//! resulting event stream is drained into [`AnalysisUpdate`]s that both
//! front-ends draw in order.

pub mod render;
pub mod score;

pub use render::StreamRenderer;
pub use score::extract_score;

use crate::credentials::{CredentialSet, SessionContext};
use crate::errors::{AnalysisError, ValidationError};
use crate::models::{AgentEvent, AnalysisKind, AnalysisOutcome, AnalysisUpdate};
use crate::request::AnalysisForm;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::time::Instant;
use tracing::{debug, error, info};

/// Everything the agent needs for one run.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub kind: AnalysisKind,
    pub query: String,
    pub context: SessionContext,
}

/// Produces the agent's events for an invocation.
///
/// Dropping the returned stream stops the run.
pub trait FragmentSource: Send + Sync {
    fn invoke(&self, invocation: Invocation) -> BoxStream<'static, Result<AgentEvent, AnalysisError>>;
}

/// Validate a submission and start it.
///
/// The form is checked first, then the credentials; `source` is only called
/// once both pass.
pub fn start(
    source: &dyn FragmentSource,
    credentials: &CredentialSet,
    form: &AnalysisForm,
) -> Result<BoxStream<'static, AnalysisUpdate>, ValidationError> {
    let request = form.validate()?;
    let context = SessionContext::new(credentials)?;

    let kind = request.kind();
    info!("Starting {}", kind);
    debug!("Query: {}", request.query());

    let events = source.invoke(Invocation {
        kind,
        query: request.query(),
        context,
    });
    Ok(drain(events).boxed())
}

fn drain(
    mut events: BoxStream<'static, Result<AgentEvent, AnalysisError>>,
) -> impl Stream<Item = AnalysisUpdate> + Send + 'static {
    async_stream::stream! {
        let started = Instant::now();
        let mut renderer = StreamRenderer::new();
        let mut tool_calls = 0;

        while let Some(event) = events.next().await {
            match event {
                Ok(AgentEvent::Content(text)) => {
                    if let Some(offset) = renderer.push(&text) {
                        yield AnalysisUpdate::Fragment { offset, text };
                    }
                }
                Ok(AgentEvent::ToolCall { name, arguments }) => {
                    tool_calls += 1;
                    info!("Agent called {}", name);
                    yield AnalysisUpdate::Tool { name, arguments };
                }
                Err(e) => {
                    error!("Analysis failed: {}", e);
                    yield AnalysisUpdate::Failed { message: e.to_string() };
                    return;
                }
            }
        }

        let (text, fragments) = renderer.finish();
        let score = extract_score(&text);
        let duration_seconds = started.elapsed().as_secs_f64();
        info!(
            "Analysis complete in {:.1}s: {} fragments, {} tool calls, score {:?}",
            duration_seconds, fragments, tool_calls, score
        );

        yield AnalysisUpdate::Finished(AnalysisOutcome {
            text,
            score,
            fragments,
            tool_calls,
            duration_seconds,
        });
    }
}
