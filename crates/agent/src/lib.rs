//! Task execution: the tool gateway, the reasoning-process abstraction,
//! and the agent runner that drives one research task to a partial
//! result.

pub mod backends;
pub mod gateway;
pub mod reasoner;
pub mod runner;

pub use gateway::{ToolBackend, ToolError, ToolGateway};
pub use reasoner::{ChatReasoner, Reasoner, ReasonerError, ReasoningStep, Transcript, TranscriptEntry};
pub use runner::{AgentRunner, EventSink, RunnerEvent};
