//! Uniform capability interface over the external research tools.
//!
//! The gateway is a pure request/response boundary: it enforces the
//! per-call deadline and bounds upstream concurrency, and emits no
//! events. Callers narrate their own tool use.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Semaphore;

use dossier_core::{TaskError, ToolCapability};

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("no backend registered for capability '{0}'")]
    Unavailable(ToolCapability),

    #[error("{tool} call timed out after {deadline:?}")]
    Timeout {
        tool: ToolCapability,
        deadline: Duration,
    },

    #[error("{tool} upstream failure: {message}")]
    Upstream {
        tool: ToolCapability,
        message: String,
    },
}

impl From<ToolError> for TaskError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Unavailable(capability) => TaskError::Misconfigured(capability),
            ToolError::Timeout { tool, .. } => TaskError::Timeout { tool },
            ToolError::Upstream { tool, message } => TaskError::Upstream {
                source: tool.as_str().to_string(),
                message,
            },
        }
    }
}

/// One concrete tool implementation behind a capability.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    fn capability(&self) -> ToolCapability;

    async fn invoke(&self, query: &str) -> Result<String, ToolError>;
}

/// Capability-keyed tool dispatch shared by every runner in a process.
///
/// The semaphore is the single pool shared across concurrent runners and
/// sessions; a call either eventually completes, times out, or fails.
pub struct ToolGateway {
    backends: HashMap<ToolCapability, Arc<dyn ToolBackend>>,
    deadline: Duration,
    permits: Semaphore,
}

impl ToolGateway {
    pub fn new(deadline: Duration, max_in_flight: usize) -> Self {
        Self {
            backends: HashMap::new(),
            deadline,
            permits: Semaphore::new(max_in_flight),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn ToolBackend>) -> Self {
        self.backends.insert(backend.capability(), backend);
        self
    }

    pub fn has_capability(&self, capability: ToolCapability) -> bool {
        self.backends.contains_key(&capability)
    }

    pub fn capabilities(&self) -> Vec<ToolCapability> {
        self.backends.keys().copied().collect()
    }

    /// Invoke a capability with the configured deadline. The deadline
    /// covers queueing for a permit, so a saturated pool surfaces as a
    /// timeout rather than an unbounded wait.
    pub async fn invoke(&self, capability: ToolCapability, query: &str) -> Result<String, ToolError> {
        let backend = self
            .backends
            .get(&capability)
            .ok_or(ToolError::Unavailable(capability))?;

        let call = async {
            let _permit = self.permits.acquire().await.map_err(|_| ToolError::Upstream {
                tool: capability,
                message: "gateway pool closed".to_string(),
            })?;
            backend.invoke(query).await
        };

        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(tool = %capability, deadline = ?self.deadline, "tool call timed out");
                Err(ToolError::Timeout {
                    tool: capability,
                    deadline: self.deadline,
                })
            }
        }
    }
}

impl Default for ToolGateway {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE, DEFAULT_MAX_IN_FLIGHT)
    }
}
