//! Session manager: binds one orchestration run to one client
//! connection and owns its lifetime.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use dossier_core::{CompanyRecord, ResearchRequest};
use events::EventEnvelope;
use orchestrator::{Orchestrator, RunControl};

use crate::messages::ControlMessage;

/// Credential check performed once, at request time.
pub trait CredentialValidator: Send + Sync {
    fn validate(&self, key: &str) -> bool;
}

/// Static company-data lookup used to seed the dossier header.
pub trait CompanyLookup: Send + Sync {
    fn lookup(&self, name: &str) -> Option<CompanyRecord>;
}

#[derive(Clone)]
pub struct SessionDeps {
    pub orchestrator: Arc<Orchestrator>,
    pub credentials: Arc<dyn CredentialValidator>,
    pub directory: Arc<dyn CompanyLookup>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session already has a research request")]
    Busy,

    #[error("invalid API key")]
    InvalidCredential,
}

impl SessionError {
    pub fn to_control(&self) -> ControlMessage {
        match self {
            Self::Busy => ControlMessage::Busy {
                message: self.to_string(),
            },
            Self::InvalidCredential => ControlMessage::error(self.to_string()),
        }
    }
}

/// One client connection's research session. Accepts exactly one
/// request for its whole lifetime; cancellation is idempotent and also
/// fires on teardown.
pub struct Session {
    deps: SessionDeps,
    run: Option<RunControl>,
}

impl Session {
    pub fn new(deps: SessionDeps) -> Self {
        Self { deps, run: None }
    }

    pub fn has_run(&self) -> bool {
        self.run.is_some()
    }

    /// Start the session's one run. Returns the run's event stream; the
    /// cancellation side stays with the session.
    pub fn start(
        &mut self,
        api_key: &str,
        company_name: String,
        depth: String,
        focus_areas: Option<Vec<String>>,
    ) -> Result<mpsc::UnboundedReceiver<EventEnvelope>, SessionError> {
        if self.run.is_some() {
            return Err(SessionError::Busy);
        }
        if !self.deps.credentials.validate(api_key) {
            return Err(SessionError::InvalidCredential);
        }

        let company = self.deps.directory.lookup(&company_name);
        let request = ResearchRequest {
            company_name,
            depth,
            focus_areas,
        };

        let handle = self.deps.orchestrator.start(request, company);
        tracing::info!(run_id = %handle.run_id, "session accepted research request");

        let (control, events) = handle.split();
        self.run = Some(control);
        Ok(events)
    }

    /// Cooperative cancel. No-op when no run exists or the run is
    /// already cancelled or terminal.
    pub fn cancel(&self) {
        if let Some(run) = &self.run {
            run.cancel();
        }
    }
}
