//! The reasoning process behind a task, modeled as a black box.
//!
//! Anything that can look at a task transcript and decide the next step
//! (narrate, call a tool, or answer) satisfies [`Reasoner`]. The
//! production implementation speaks an OpenAI-compatible chat-completions
//! API; tests use scripted implementations.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use dossier_core::{TaskDefinition, TaskId, ToolCapability};

#[derive(Error, Debug)]
pub enum ReasonerError {
    #[error("reasoning backend error: {0}")]
    Backend(String),
}

/// One decision from the reasoning process.
#[derive(Debug, Clone, PartialEq)]
pub enum ReasoningStep {
    /// Free-form progress narration, no action taken.
    Narrate(String),

    /// Invoke a gateway capability, optionally narrating first.
    CallTool {
        capability: ToolCapability,
        query: String,
        preamble: Option<String>,
    },

    /// The raw final answer. The runner parses and shape-checks it.
    FinalAnswer(String),
}

/// What the reasoning process has seen and done so far for one task.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub task: TaskId,
    pub instructions: String,
    pub entries: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone)]
pub enum TranscriptEntry {
    Narration(String),
    ToolCall { tool: ToolCapability, query: String },
    ToolOutput { tool: ToolCapability, output: String },
}

impl Transcript {
    pub fn for_task(definition: &TaskDefinition, subject: &str) -> Self {
        Self {
            task: definition.id,
            instructions: format!(
                "{}\n\nCompany to research: {}",
                definition.instructions, subject
            ),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Reasoning rounds consumed so far (tool calls, not narration).
    pub fn tool_calls(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, TranscriptEntry::ToolCall { .. }))
            .count()
    }
}

/// Capability-polymorphic reasoning process.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn next_step(&self, transcript: &Transcript) -> Result<ReasoningStep, ReasonerError>;
}

const SEARCH_TOOL: &str = "web_search";
const SCRAPE_TOOL: &str = "fetch_page";

/// OpenAI-compatible chat-completions client. Gateway capabilities are
/// exposed to the model as function tools; transcript entries are
/// replayed as plain chat turns.
pub struct ChatReasoner {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallMessage>,
}

#[derive(Deserialize)]
struct ToolCallMessage {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

impl ChatReasoner {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn tool_definitions() -> Value {
        json!([
            {
                "type": "function",
                "function": {
                    "name": SEARCH_TOOL,
                    "description": "Search the web for information about a company or topic",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "query": {"type": "string", "description": "The search query"}
                        },
                        "required": ["query"]
                    }
                }
            },
            {
                "type": "function",
                "function": {
                    "name": SCRAPE_TOOL,
                    "description": "Fetch a web page and return its readable text",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "url": {"type": "string", "description": "The URL to fetch"}
                        },
                        "required": ["url"]
                    }
                }
            }
        ])
    }

    fn messages_for(transcript: &Transcript) -> Vec<Value> {
        let mut messages = vec![json!({"role": "system", "content": transcript.instructions})];
        for entry in &transcript.entries {
            match entry {
                TranscriptEntry::Narration(text) => {
                    messages.push(json!({"role": "assistant", "content": text}));
                }
                TranscriptEntry::ToolCall { tool, query } => {
                    messages.push(json!({
                        "role": "assistant",
                        "content": format!("Calling {} with: {}", tool, query)
                    }));
                }
                TranscriptEntry::ToolOutput { tool, output } => {
                    messages.push(json!({
                        "role": "user",
                        "content": format!("{} result:\n{}", tool, output)
                    }));
                }
            }
        }
        messages
    }

    async fn chat(&self, body: Value) -> Result<ChoiceMessage, ReasonerError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReasonerError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| ReasonerError::Backend(e.to_string()))?;

        let mut parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReasonerError::Backend(e.to_string()))?;

        if parsed.choices.is_empty() {
            return Err(ReasonerError::Backend("response carried no choices".to_string()));
        }
        Ok(parsed.choices.remove(0).message)
    }

    /// One tool-free round trip. Used by the dossier chat endpoint, not
    /// by the research loop.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, ReasonerError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ]
        });
        let message = self.chat(body).await?;
        message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ReasonerError::Backend("empty completion".to_string()))
    }

    fn step_from(message: ChoiceMessage) -> Result<ReasoningStep, ReasonerError> {
        if let Some(call) = message.tool_calls.into_iter().next() {
            let args: Value = serde_json::from_str(&call.function.arguments)
                .map_err(|e| ReasonerError::Backend(format!("bad tool arguments: {e}")))?;
            let preamble = message
                .content
                .filter(|c| !c.trim().is_empty());

            let (capability, query) = match call.function.name.as_str() {
                SEARCH_TOOL => (
                    ToolCapability::Search,
                    args.get("query").and_then(Value::as_str).unwrap_or_default(),
                ),
                SCRAPE_TOOL => (
                    ToolCapability::Scrape,
                    args.get("url").and_then(Value::as_str).unwrap_or_default(),
                ),
                other => {
                    return Err(ReasonerError::Backend(format!("unknown tool '{other}'")));
                }
            };
            return Ok(ReasoningStep::CallTool {
                capability,
                query: query.to_string(),
                preamble,
            });
        }

        match message.content {
            Some(content) if !content.trim().is_empty() => Ok(ReasoningStep::FinalAnswer(content)),
            _ => Err(ReasonerError::Backend("empty reasoning step".to_string())),
        }
    }
}

#[async_trait]
impl Reasoner for ChatReasoner {
    async fn next_step(&self, transcript: &Transcript) -> Result<ReasoningStep, ReasonerError> {
        let body = json!({
            "model": self.model,
            "messages": Self::messages_for(transcript),
            "tools": Self::tool_definitions(),
        });

        tracing::debug!(task = %transcript.task, entries = transcript.entries.len(), "requesting next step");
        let message = self.chat(body).await?;
        Self::step_from(message)
    }
}
