//! Run orchestration: fan out the selected tasks to concurrent agent
//! runners, serialize their events onto one ordered stream, and compose
//! the dossier when every task has settled.

pub mod composer;
pub mod error;
pub mod orchestrator;
pub mod run_state;

pub use error::OrchestratorError;
pub use orchestrator::{Orchestrator, OrchestratorSettings, RunControl, RunHandle};
pub use run_state::RunState;
