use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::dossier::ComponentKind;

/// Identity of one research task. The registry declares exactly one
/// definition per variant; focus-area filtering and dossier panel order
/// are both expressed in terms of these keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    CompanyOverview,
    KeyPeople,
    MarketSizing,
    CompetitorLandscape,
    GrowthMetrics,
}

impl TaskId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyOverview => "company_overview",
            Self::KeyPeople => "key_people",
            Self::MarketSizing => "market_sizing",
            Self::CompetitorLandscape => "competitor_landscape",
            Self::GrowthMetrics => "growth_metrics",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "company_overview" => Some(Self::CompanyOverview),
            "key_people" => Some(Self::KeyPeople),
            "market_sizing" => Some(Self::MarketSizing),
            "competitor_landscape" => Some(Self::CompetitorLandscape),
            "growth_metrics" => Some(Self::GrowthMetrics),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External capabilities a task may require from the tool gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolCapability {
    Search,
    Scrape,
}

impl ToolCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Scrape => "scrape",
        }
    }
}

impl std::fmt::Display for ToolCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the task registry.
#[derive(Debug, Clone, Copy)]
pub struct TaskDefinition {
    pub id: TaskId,
    /// Panel title in the composed dossier.
    pub label: &'static str,
    /// Human-readable phase narration for the event stream.
    pub phase_label: &'static str,
    /// Capabilities the agent runner needs from the tool gateway.
    pub required: &'static [ToolCapability],
    /// Declared output shape; the composer maps the partial result into a
    /// panel of this kind.
    pub shape: ComponentKind,
    /// Instruction text handed to the reasoning process.
    pub instructions: &'static str,
}

impl TaskDefinition {
    pub fn requires(&self, capability: ToolCapability) -> bool {
        self.required.contains(&capability)
    }

    /// Structural check of a final answer against the task's declared
    /// shape. This is deliberately looser than the composer's field
    /// extraction: it rejects answers that cannot possibly be shaped, and
    /// leaves the rest to best-effort composition.
    pub fn validate_partial(&self, value: &Value) -> Result<(), String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "final answer is not a JSON object".to_string())?;

        let required_field = match self.id {
            TaskId::CompanyOverview => "description",
            TaskId::KeyPeople => "key_people",
            TaskId::MarketSizing => "tam",
            TaskId::CompetitorLandscape => "direct_competitors",
            TaskId::GrowthMetrics => "key_metrics",
        };

        match obj.get(required_field) {
            Some(field) if !field.is_null() => Ok(()),
            _ => Err(format!("missing required field '{}'", required_field)),
        }
    }
}

/// Why a single task failed. Task failures never abort the run; the
/// orchestrator records them and the composer omits the panel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("required capability '{0}' is not available")]
    Misconfigured(ToolCapability),

    #[error("{tool} call exceeded its deadline")]
    Timeout { tool: ToolCapability },

    #[error("upstream failure from {source}: {message}")]
    Upstream { source: String, message: String },

    #[error("final answer did not match the declared shape: {0}")]
    SchemaViolation(String),

    #[error("step budget exhausted after {steps} reasoning rounds")]
    Incomplete { steps: usize },

    /// Internal only: a cancelled run discards all outcomes, so this
    /// never reaches the wire.
    #[error("task cancelled")]
    Cancelled,
}

/// Lifecycle of one task within a run. Transitions only ever move
/// forward: `Pending -> Running -> {Succeeded, Failed}`.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Pending,
    Running,
    Succeeded(Value),
    Failed(TaskError),
}

impl TaskOutcome {
    pub fn status_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    /// Whether moving to `next` respects the forward-only lifecycle.
    pub fn allows(&self, next: &TaskOutcome) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running) => true,
            (Self::Running, Self::Succeeded(_)) | (Self::Running, Self::Failed(_)) => true,
            // A task can be failed without ever running (capability
            // short-circuit).
            (Self::Pending, Self::Failed(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_id_round_trip() {
        for id in [
            TaskId::CompanyOverview,
            TaskId::KeyPeople,
            TaskId::MarketSizing,
            TaskId::CompetitorLandscape,
            TaskId::GrowthMetrics,
        ] {
            assert_eq!(TaskId::parse(id.as_str()), Some(id));
        }
        assert_eq!(TaskId::parse("unknown"), None);
    }

    #[test]
    fn test_task_id_serde_tag() {
        let json = serde_json::to_string(&TaskId::KeyPeople).unwrap();
        assert_eq!(json, "\"key_people\"");
    }

    #[test]
    fn test_outcome_forward_only() {
        let running = TaskOutcome::Running;
        assert!(TaskOutcome::Pending.allows(&running));
        assert!(running.allows(&TaskOutcome::Succeeded(json!({}))));
        assert!(!running.allows(&TaskOutcome::Pending));
        assert!(!TaskOutcome::Succeeded(json!({})).allows(&TaskOutcome::Running));
    }

    #[test]
    fn test_short_circuit_failure_allowed_from_pending() {
        let failed = TaskOutcome::Failed(TaskError::Misconfigured(ToolCapability::Scrape));
        assert!(TaskOutcome::Pending.allows(&failed));
    }

    #[test]
    fn test_validate_partial() {
        let def = crate::REGISTRY
            .get(TaskId::KeyPeople)
            .expect("registry entry");

        assert!(def
            .validate_partial(&json!({"key_people": [{"name": "Jane"}]}))
            .is_ok());
        assert!(def.validate_partial(&json!({"people": []})).is_err());
        assert!(def.validate_partial(&json!("just a string")).is_err());
    }
}
