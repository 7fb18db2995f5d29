//! The agent runner: drives one task's reasoning loop to a partial
//! result, narrating progress and tool use along the way.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use dossier_core::{TaskDefinition, TaskError, ToolCapability};

use crate::gateway::ToolGateway;
use crate::reasoner::{Reasoner, ReasoningStep, Transcript, TranscriptEntry};

/// How much of a query or tool output makes it onto the event stream.
/// Full text still goes into the transcript for the reasoning process.
const SUMMARY_LIMIT: usize = 240;

/// Fine-grained activity emitted while a task runs. The sink must never
/// block: the orchestrator end is an unbounded channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    Progress(String),
    ToolInvoked { tool: ToolCapability, args: String },
    ToolResult { tool: ToolCapability, summary: String },
}

/// One-way, non-blocking sink for runner activity.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RunnerEvent);
}

/// Executes exactly one task definition against a subject.
pub struct AgentRunner {
    gateway: Arc<ToolGateway>,
    reasoner: Arc<dyn Reasoner>,
    step_budget: usize,
}

impl AgentRunner {
    pub fn new(gateway: Arc<ToolGateway>, reasoner: Arc<dyn Reasoner>, step_budget: usize) -> Self {
        Self {
            gateway,
            reasoner,
            step_budget,
        }
    }

    /// Drive the reasoning loop until it yields a conforming final
    /// answer, fails, exhausts the step budget, or observes cancellation.
    ///
    /// Tool failures are terminal for the task on first occurrence; the
    /// step budget is the only retry bound the runner applies.
    pub async fn run(
        &self,
        subject: &str,
        definition: &'static TaskDefinition,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<Value, TaskError> {
        let mut transcript = Transcript::for_task(definition, subject);

        for round in 0..self.step_budget {
            if cancel.is_cancelled() {
                return Err(TaskError::Cancelled);
            }

            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TaskError::Cancelled),
                step = self.reasoner.next_step(&transcript) => step.map_err(|e| TaskError::Upstream {
                    source: "agent".to_string(),
                    message: e.to_string(),
                })?,
            };

            match step {
                ReasoningStep::Narrate(text) => {
                    sink.emit(RunnerEvent::Progress(text.clone()));
                    transcript.push(TranscriptEntry::Narration(text));
                }
                ReasoningStep::CallTool {
                    capability,
                    query,
                    preamble,
                } => {
                    if let Some(text) = preamble {
                        sink.emit(RunnerEvent::Progress(text.clone()));
                        transcript.push(TranscriptEntry::Narration(text));
                    }

                    if cancel.is_cancelled() {
                        return Err(TaskError::Cancelled);
                    }

                    sink.emit(RunnerEvent::ToolInvoked {
                        tool: capability,
                        args: summarize(&query),
                    });

                    let output = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(TaskError::Cancelled),
                        result = self.gateway.invoke(capability, &query) => result?,
                    };

                    sink.emit(RunnerEvent::ToolResult {
                        tool: capability,
                        summary: summarize(&output),
                    });
                    transcript.push(TranscriptEntry::ToolCall {
                        tool: capability,
                        query,
                    });
                    transcript.push(TranscriptEntry::ToolOutput {
                        tool: capability,
                        output,
                    });
                }
                ReasoningStep::FinalAnswer(raw) => {
                    let value = parse_final_answer(&raw)?;
                    definition
                        .validate_partial(&value)
                        .map_err(TaskError::SchemaViolation)?;
                    tracing::debug!(task = %definition.id, rounds = round + 1, "task produced final answer");
                    return Ok(value);
                }
            }
        }

        Err(TaskError::Incomplete {
            steps: self.step_budget,
        })
    }
}

/// Parse a raw final answer into JSON, tolerating markdown code fences.
fn parse_final_answer(raw: &str) -> Result<Value, TaskError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|e| TaskError::SchemaViolation(format!("final answer is not valid JSON: {e}")))
}

pub(crate) fn summarize(text: &str) -> String {
    if text.chars().count() <= SUMMARY_LIMIT {
        return text.to_string();
    }
    let mut out: String = text.chars().take(SUMMARY_LIMIT).collect();
    out.push('…');
    out
}
