use std::sync::Arc;

use agent::backends::{PageFetch, WebSearch};
use agent::{ChatReasoner, ToolGateway};
use orchestrator::Orchestrator;
use websocket::{CredentialValidator, SessionDeps};

use crate::config::ServerConfig;
use crate::directory::CompanyDirectory;

/// Static API key comparison, as the mocked deployment does it.
pub struct StaticApiKey(String);

impl CredentialValidator for StaticApiKey {
    fn validate(&self, key: &str) -> bool {
        key == self.0
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub orchestrator: Arc<Orchestrator>,
    pub directory: Arc<CompanyDirectory>,
    pub chat: Arc<ChatReasoner>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let mut gateway = ToolGateway::new(config.tool_deadline, config.tool_max_in_flight);
        if let Some(key) = &config.search_api_key {
            gateway = gateway.with_backend(Arc::new(WebSearch::new(
                config.search_endpoint.clone(),
                key.clone(),
            )));
        }
        gateway = gateway.with_backend(Arc::new(PageFetch::new()));

        let chat = Arc::new(ChatReasoner::new(
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        ));
        let orchestrator = Arc::new(Orchestrator::new(Arc::new(gateway), chat.clone()));

        Self {
            config: Arc::new(config),
            orchestrator,
            directory: Arc::new(CompanyDirectory::new()),
            chat,
        }
    }

    pub fn session_deps(&self) -> SessionDeps {
        SessionDeps {
            orchestrator: self.orchestrator.clone(),
            credentials: Arc::new(StaticApiKey(self.config.api_key.clone())),
            directory: self.directory.clone(),
        }
    }
}
