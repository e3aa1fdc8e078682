use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use findoc_extract::Extractor;
use findoc_models::document::DocumentRef;
use findoc_models::stage::Capability;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AgentError;

/// A capability a stage can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn capability(&self) -> Capability;

    fn name(&self) -> &'static str {
        self.capability().tool_name()
    }

    /// One-paragraph usage description shown to the model.
    fn description(&self) -> &str;

    /// Run the tool. `document` is the run's document, used when the input names no file.
    async fn call(
        &self,
        input: &serde_json::Value,
        document: &DocumentRef,
    ) -> Result<String, AgentError>;
}

/// The tools available to a run, at most one per capability.
#[derive(Default, Clone)]
pub struct Toolbox {
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same capability.
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.retain(|t| t.capability() != tool.capability());
        self.tools.push(tool);
        self
    }

    pub fn get(&self, capability: Capability) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|t| t.capability() == capability)
            .cloned()
    }

    /// Registered tools for the given capabilities, in capability order.
    pub fn for_capabilities(&self, capabilities: &[Capability]) -> Vec<Arc<dyn Tool>> {
        capabilities.iter().filter_map(|c| self.get(*c)).collect()
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        self.tools.iter().map(|t| t.capability()).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReadDocumentInput {
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    max_pages: Option<usize>,
    #[serde(default)]
    focus_sections: Option<bool>,
}

/// Reads the financial document through the extractor.
///
/// Extraction errors are returned to the model as `ERROR:` text, never as `Err`.
pub struct ReadDocumentTool {
    extractor: Arc<Extractor>,
}

impl ReadDocumentTool {
    pub fn new(extractor: Arc<Extractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Tool for ReadDocumentTool {
    fn capability(&self) -> Capability {
        Capability::ReadDocument
    }

    fn description(&self) -> &str {
        "Read and extract text from the PDF financial document. Input: \
         {\"file_path\": string (optional, defaults to the document under review), \
         \"max_pages\": integer (optional, default 50, 0 for all pages), \
         \"focus_sections\": boolean (optional, default true, \
         prioritizes financial statement pages)}."
    }

    async fn call(
        &self,
        input: &serde_json::Value,
        document: &DocumentRef,
    ) -> Result<String, AgentError> {
        let args: ReadDocumentInput = if input.is_null() {
            ReadDocumentInput::default()
        } else {
            serde_json::from_value(input.clone()).map_err(|e| {
                AgentError::Tool(format!("invalid read_financial_document input: {e}"))
            })?
        };

        let path = args
            .file_path
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| document.path().to_path_buf());
        let max_pages = args
            .max_pages
            .unwrap_or(self.extractor.config().default_max_pages);
        let focus_sections = args.focus_sections.unwrap_or(true);

        debug!(path = %path.display(), max_pages, focus_sections, "Reading document");

        let extractor = Arc::clone(&self.extractor);
        let outcome = tokio::task::spawn_blocking(move || {
            extractor.extract(&path, max_pages, focus_sections)
        })
        .await
        .map_err(|e| AgentError::Tool(format!("document reader task failed: {e}")))?;

        Ok(match outcome {
            Ok(result) => result.text,
            Err(e) => {
                warn!(error = %e, "Document read failed");
                format!("ERROR: {e}")
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

/// A web search backend. Mockable for testing.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AgentError>;
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

/// Google results via serper.dev.
pub struct SerperSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
}

impl SerperSearch {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        max_results: usize,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            max_results,
        }
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AgentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest {
                q: query,
                num: self.max_results,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::Tool(format!(
                "search request failed with status {status}: {error_text}"
            )));
        }

        let body: SerperResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Tool(format!("failed to parse search response: {e}")))?;
        Ok(body.organic.into_iter().take(self.max_results).collect())
    }
}

#[derive(Debug, Deserialize)]
struct WebSearchInput {
    query: String,
}

/// Web search for market context and industry comparisons.
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {}\n   {}\n   {}", i + 1, hit.title, hit.link, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Tool for WebSearchTool {
    fn capability(&self) -> Capability {
        Capability::WebSearch
    }

    fn description(&self) -> &str {
        "Search the internet for market context, news and industry comparisons. \
         Input: {\"query\": string}."
    }

    async fn call(
        &self,
        input: &serde_json::Value,
        _document: &DocumentRef,
    ) -> Result<String, AgentError> {
        let args: WebSearchInput = serde_json::from_value(input.clone())
            .map_err(|e| AgentError::Tool(format!("invalid web_search input: {e}")))?;
        debug!(query = %args.query, "Web search");
        let hits = self.provider.search(&args.query).await?;
        Ok(format_hits(&hits))
    }
}
