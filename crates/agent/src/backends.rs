//! Network implementations behind the tool gateway capabilities.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use dossier_core::ToolCapability;

use crate::gateway::{ToolBackend, ToolError};

const SEARCH_RESULT_COUNT: usize = 5;
const PAGE_TEXT_LIMIT: usize = 6000;

fn upstream(tool: ToolCapability, err: impl std::fmt::Display) -> ToolError {
    ToolError::Upstream {
        tool,
        message: err.to_string(),
    }
}

/// Web search via a Serper-style JSON API: `POST {endpoint}` with
/// `{"q": ..., "num": ...}`, results under `organic`.
pub struct WebSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl WebSearch {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    fn format_results(body: &Value) -> String {
        let mut out = String::from("Search results:\n\n");
        let organic = body
            .get("organic")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if organic.is_empty() {
            out.push_str("No results found.\n");
            return out;
        }

        for (i, item) in organic.iter().take(SEARCH_RESULT_COUNT).enumerate() {
            let title = item.get("title").and_then(Value::as_str).unwrap_or("");
            let link = item.get("link").and_then(Value::as_str).unwrap_or("");
            let snippet = item.get("snippet").and_then(Value::as_str).unwrap_or("");
            out.push_str(&format!("{}. {}\n   URL: {}\n   {}\n\n", i + 1, title, link, snippet));
        }
        out
    }
}

#[async_trait]
impl ToolBackend for WebSearch {
    fn capability(&self) -> ToolCapability {
        ToolCapability::Search
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        tracing::debug!(query, "web search");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query, "num": SEARCH_RESULT_COUNT }))
            .send()
            .await
            .map_err(|e| upstream(ToolCapability::Search, e))?
            .error_for_status()
            .map_err(|e| upstream(ToolCapability::Search, e))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| upstream(ToolCapability::Search, e))?;

        Ok(Self::format_results(&body))
    }
}

/// Page fetch: GET the URL and reduce the document to readable text
/// (title, meta description, main content).
pub struct PageFetch {
    client: reqwest::Client,
}

impl PageFetch {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("dossier-engine/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for PageFetch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolBackend for PageFetch {
    fn capability(&self) -> ToolCapability {
        ToolCapability::Scrape
    }

    async fn invoke(&self, query: &str) -> Result<String, ToolError> {
        tracing::debug!(url = query, "fetching page");

        let response = self
            .client
            .get(query)
            .send()
            .await
            .map_err(|e| upstream(ToolCapability::Scrape, e))?
            .error_for_status()
            .map_err(|e| upstream(ToolCapability::Scrape, e))?;

        let html = response
            .text()
            .await
            .map_err(|e| upstream(ToolCapability::Scrape, e))?;

        Ok(extract_readable(query, &html))
    }
}

/// Reduce an HTML document to the text an agent can reason over. The
/// `scraper::Html` DOM is not `Send`, so this stays synchronous.
fn extract_readable(url: &str, html: &str) -> String {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);
    let mut out = format!("Content from {url}:\n\n");

    if let Ok(selector) = Selector::parse("title") {
        if let Some(title) = document.select(&selector).next() {
            let title = collapse_whitespace(&title.text().collect::<String>());
            if !title.is_empty() {
                out.push_str(&format!("Title: {title}\n\n"));
            }
        }
    }

    if let Ok(selector) = Selector::parse("meta[name=\"description\"]") {
        if let Some(description) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
        {
            out.push_str(&format!("Description: {}\n\n", collapse_whitespace(description)));
        }
    }

    out.push_str("--- MAIN CONTENT ---\n\n");

    // Prefer designated content containers, fall back to the whole body.
    let mut content = String::new();
    for container in ["main", "article", "#content", ".content"] {
        if let Ok(selector) = Selector::parse(container) {
            if let Some(element) = document.select(&selector).next() {
                content = element.text().collect::<Vec<_>>().join(" ");
                break;
            }
        }
    }
    if content.is_empty() {
        if let Ok(selector) = Selector::parse("body") {
            if let Some(body) = document.select(&selector).next() {
                content = body.text().collect::<Vec<_>>().join(" ");
            }
        }
    }

    let content = collapse_whitespace(&content);
    if content.chars().count() > PAGE_TEXT_LIMIT {
        out.push_str(&content.chars().take(PAGE_TEXT_LIMIT).collect::<String>());
        out.push_str(" …");
    } else {
        out.push_str(&content);
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
