use serde::{Deserialize, Serialize};

use super::registry::REGISTRY;
use super::task::{TaskDefinition, TaskId};
use crate::error::ValidationError;

/// Research depth. Selects the agent runner's step budget; nothing else.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    #[default]
    Standard,
    Detailed,
}

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Detailed => "detailed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// A research request exactly as the client sent it. Validation happens
/// in the orchestrator's `Starting` state, not at the transport edge, so
/// the raw strings are carried here untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResearchRequest {
    pub company_name: String,
    pub depth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_areas: Option<Vec<String>>,
}

impl ResearchRequest {
    pub fn new(company_name: impl Into<String>, depth: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            depth: depth.into(),
            focus_areas: None,
        }
    }

    pub fn with_focus(mut self, focus: Vec<String>) -> Self {
        self.focus_areas = Some(focus);
        self
    }

    /// Validate the raw request into an executable plan. Unknown depth
    /// strings and unknown focus areas are rejected, never defaulted.
    pub fn validate(&self) -> Result<ResearchPlan, ValidationError> {
        let subject = self.company_name.trim();
        if subject.is_empty() {
            return Err(ValidationError::EmptySubject);
        }

        let depth =
            Depth::parse(&self.depth).ok_or_else(|| ValidationError::UnknownDepth(self.depth.clone()))?;

        let mut focus = Vec::new();
        if let Some(areas) = &self.focus_areas {
            for area in areas {
                let id = TaskId::parse(area)
                    .ok_or_else(|| ValidationError::UnknownFocusArea(area.clone()))?;
                if !focus.contains(&id) {
                    focus.push(id);
                }
            }
        }

        Ok(ResearchPlan {
            subject: subject.to_string(),
            depth,
            tasks: REGISTRY.filter(&focus),
        })
    }
}

/// The validated, immutable form of a request: a trimmed subject, a
/// typed depth, and the selected task definitions in registry order.
#[derive(Debug, Clone)]
pub struct ResearchPlan {
    pub subject: String,
    pub depth: Depth,
    pub tasks: Vec<&'static TaskDefinition>,
}
