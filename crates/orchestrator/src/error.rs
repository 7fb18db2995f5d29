use dossier_core::TaskId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("task {task} cannot move from {from} to {to}")]
    InvalidTransition {
        task: TaskId,
        from: &'static str,
        to: &'static str,
    },

    #[error("task {0} is not part of this run")]
    UnknownTask(TaskId),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
