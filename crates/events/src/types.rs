//! Typed events narrating one research run.
//!
//! Serialized tags are the wire protocol: clients switch on `type` and
//! treat `result`/`error` as terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dossier_core::{Dossier, TaskId, ToolCapability};

/// Envelope wrapping an event with its run-scoped sequence number.
///
/// Sequence numbers are assigned by the orchestrator's forwarding loop at
/// the moment of forwarding, which makes them monotonic on the stream even
/// though producers run concurrently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(seq: u64, event: Event) -> Self {
        Self {
            seq,
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All events a run can emit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The run was accepted and tasks are about to launch.
    Started { company: String, message: String },

    /// First activity observed for a task.
    PhaseEntered { task: TaskId, message: String },

    /// Narration from a task's reasoning process. Task failures are also
    /// narrated here, tagged with `error: true`.
    Progress {
        task: TaskId,
        message: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        error: bool,
    },

    /// A task is about to call an external tool.
    ToolInvoked {
        task: TaskId,
        tool: ToolCapability,
        args: String,
    },

    /// An external tool call returned.
    ToolResult {
        task: TaskId,
        tool: ToolCapability,
        summary: String,
    },

    /// A task reached a terminal outcome, successful or not.
    TaskCompleted {
        task: TaskId,
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Terminal: the run completed and composed a dossier.
    #[serde(rename = "result")]
    RunCompleted { data: Dossier },

    /// Terminal: the run failed before completing.
    #[serde(rename = "error")]
    RunFailed { message: String },
}

impl Event {
    /// The task this event belongs to, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Event::PhaseEntered { task, .. }
            | Event::Progress { task, .. }
            | Event::ToolInvoked { task, .. }
            | Event::ToolResult { task, .. }
            | Event::TaskCompleted { task, .. } => Some(*task),
            Event::Started { .. } | Event::RunCompleted { .. } | Event::RunFailed { .. } => None,
        }
    }

    /// Terminal events are the last thing a run ever emits.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::RunCompleted { .. } | Event::RunFailed { .. })
    }

    pub fn type_str(&self) -> &'static str {
        match self {
            Event::Started { .. } => "started",
            Event::PhaseEntered { .. } => "phase_entered",
            Event::Progress { .. } => "progress",
            Event::ToolInvoked { .. } => "tool_invoked",
            Event::ToolResult { .. } => "tool_result",
            Event::TaskCompleted { .. } => "task_completed",
            Event::RunCompleted { .. } => "result",
            Event::RunFailed { .. } => "error",
        }
    }
}
