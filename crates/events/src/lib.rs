//! Event vocabulary for the research event stream.

pub mod types;

pub use types::{Event, EventEnvelope};
