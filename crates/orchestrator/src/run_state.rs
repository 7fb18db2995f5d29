//! Per-run bookkeeping. Owned exclusively by the run's forwarding loop;
//! nothing else writes to it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use dossier_core::{TaskId, TaskOutcome};

use crate::error::{OrchestratorError, Result};

pub struct RunState {
    pub run_id: Uuid,
    pub subject: String,
    pub started_at: DateTime<Utc>,
    outcomes: BTreeMap<TaskId, TaskOutcome>,
}

impl RunState {
    pub fn new(run_id: Uuid, subject: impl Into<String>, tasks: impl IntoIterator<Item = TaskId>) -> Self {
        Self {
            run_id,
            subject: subject.into(),
            started_at: Utc::now(),
            outcomes: tasks.into_iter().map(|t| (t, TaskOutcome::Pending)).collect(),
        }
    }

    /// Move a task to its next lifecycle state, enforcing the
    /// forward-only transition rule.
    pub fn transition(&mut self, task: TaskId, next: TaskOutcome) -> Result<()> {
        let current = self
            .outcomes
            .get(&task)
            .ok_or(OrchestratorError::UnknownTask(task))?;

        if !current.allows(&next) {
            return Err(OrchestratorError::InvalidTransition {
                task,
                from: current.status_str(),
                to: next.status_str(),
            });
        }
        self.outcomes.insert(task, next);
        Ok(())
    }

    pub fn outcome(&self, task: TaskId) -> Option<&TaskOutcome> {
        self.outcomes.get(&task)
    }

    pub fn all_terminal(&self) -> bool {
        self.outcomes.values().all(TaskOutcome::is_terminal)
    }

    /// Partial results of every succeeded task, keyed by identity.
    pub fn succeeded(&self) -> BTreeMap<TaskId, Value> {
        self.outcomes
            .iter()
            .filter_map(|(task, outcome)| match outcome {
                TaskOutcome::Succeeded(value) => Some((*task, value.clone())),
                _ => None,
            })
            .collect()
    }

    /// Synchronized view of task statuses for observers outside the
    /// forwarding loop.
    pub fn snapshot(&self) -> BTreeMap<TaskId, &'static str> {
        self.outcomes
            .iter()
            .map(|(task, outcome)| (*task, outcome.status_str()))
            .collect()
    }
}
