//! Domain model for the research engine.
//!
//! Everything here is plain data: requests, the task catalog, task
//! outcomes, and the dossier the composer assembles at the end of a run.
//! No IO happens in this crate.

pub mod domain;
pub mod error;

pub use domain::company::{CompanyRecord, FundingRound};
pub use domain::dossier::{
    CompanySummary, ComponentData, ComponentKind, DashboardComponent, Dossier, ListItem,
    PersonEntry, SizeClass, StatFigure, TextPayload,
};
pub use domain::registry::{TaskRegistry, REGISTRY};
pub use domain::request::{Depth, ResearchPlan, ResearchRequest};
pub use domain::task::{TaskDefinition, TaskError, TaskId, TaskOutcome, ToolCapability};
pub use error::ValidationError;
