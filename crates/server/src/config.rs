use std::env;
use std::time::Duration;

use tracing::warn;

// The development default mirrors the mocked deployment; real
// deployments must override it.
const DEFAULT_API_KEY: &str = "your-secret-api-key-12345";

/// Server settings resolved from the environment, with working defaults
/// for everything except the upstream API credentials.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (`DOSSIER_BIND`).
    pub bind_addr: String,
    /// API key clients must present (`DOSSIER_API_KEY`).
    pub api_key: String,
    /// OpenAI-compatible endpoint for the reasoning agent
    /// (`LLM_BASE_URL`).
    pub llm_base_url: String,
    /// Credential for the reasoning agent (`OPENAI_API_KEY`).
    pub llm_api_key: String,
    /// Model identifier (`LLM_MODEL`).
    pub llm_model: String,
    /// Search API endpoint (`SERPER_ENDPOINT`).
    pub search_endpoint: String,
    /// Search API key (`SERPER_API_KEY`); search capability is disabled
    /// when absent.
    pub search_api_key: Option<String>,
    /// Per-tool-call deadline (`TOOL_DEADLINE_SECS`).
    pub tool_deadline: Duration,
    /// Upstream tool concurrency bound (`TOOL_MAX_IN_FLIGHT`).
    pub tool_max_in_flight: usize,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, raw = %raw, "unparsable value, using default");
            default
        }),
        Err(_) => default,
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let api_key = env_or("DOSSIER_API_KEY", DEFAULT_API_KEY);
        if api_key == DEFAULT_API_KEY {
            warn!("DOSSIER_API_KEY not set, using the development default");
        }

        let llm_api_key = env_or("OPENAI_API_KEY", "");
        if llm_api_key.is_empty() {
            warn!("OPENAI_API_KEY not set, research runs will fail at the reasoning agent");
        }

        let search_api_key = env::var("SERPER_API_KEY").ok().filter(|k| !k.is_empty());
        if search_api_key.is_none() {
            warn!("SERPER_API_KEY not set, the search capability is disabled");
        }

        Self {
            bind_addr: env_or("DOSSIER_BIND", "0.0.0.0:8000"),
            api_key,
            llm_base_url: env_or("LLM_BASE_URL", "https://api.openai.com/v1"),
            llm_api_key,
            llm_model: env_or("LLM_MODEL", "gpt-4o"),
            search_endpoint: env_or("SERPER_ENDPOINT", "https://google.serper.dev/search"),
            search_api_key,
            tool_deadline: Duration::from_secs(env_parse("TOOL_DEADLINE_SECS", 20)),
            tool_max_in_flight: env_parse("TOOL_MAX_IN_FLIGHT", 8),
        }
    }
}
