use serde::{Deserialize, Serialize};

use crate::stage::{Capability, StageKind};

/// Terms whose presence marks a page as financially relevant.
pub const DEFAULT_FINANCIAL_KEYWORDS: &[&str] = &[
    "income statement",
    "balance sheet",
    "cash flow",
    "financial statements",
    "revenue",
    "net income",
    "earnings",
    "eps",
    "ebitda",
    "margins",
    "assets",
    "liabilities",
    "equity",
    "debt",
    "cash and cash equivalents",
    "operating",
    "investing",
    "financing",
    "quarterly",
    "annual",
    "consolidated",
    "unaudited",
    "audited",
    "management discussion",
];

/// Top-level configuration for findoc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FindocConfig {
    pub extractor: ExtractorConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub agents: AgentsConfig,
}

/// Configuration for the document extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Directory searched when a requested path does not exist. Uploads are staged here too.
    pub documents_dir: String,
    /// Preferred file inside `documents_dir` for fallback resolution.
    pub fallback_file: String,
    pub fallback_enabled: bool,
    /// Page budget used when a caller does not pass one. 0 means no cap.
    pub default_max_pages: usize,
    /// Documents with more pages than this get keyword prioritization.
    pub focus_threshold: usize,
    pub keywords: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            documents_dir: "data".to_string(),
            fallback_file: "TSLA-Q2-2025-Update.pdf".to_string(),
            fallback_enabled: true,
            default_max_pages: 50,
            focus_threshold: 30,
            keywords: DEFAULT_FINANCIAL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Which chat-completion backend to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Groq if its key is present, else Gemini.
    #[default]
    Auto,
    Groq,
    Gemini,
    ClaudeCli,
    OpenaiCompat,
}

/// Configuration for the LLM client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Model identifier. Empty selects the provider's preset.
    pub model: String,
    /// Base URL for `openai_compat`. Empty selects the provider's preset.
    pub base_url: String,
    pub call_timeout_seconds: u64,
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Auto,
            model: String::new(),
            base_url: String::new(),
            call_timeout_seconds: 120,
            temperature: None,
        }
    }
}

/// Configuration for the web search tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Register the web search tool when a key is available.
    pub enabled: bool,
    pub endpoint: String,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://google.serper.dev/search".to_string(),
            max_results: 5,
        }
    }
}

/// Configuration for the stage agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentsConfig {
    /// Default cap on LLM rounds per stage.
    pub max_iterations: u32,
    /// Default cap on LLM calls per stage per minute.
    pub max_requests_per_minute: u32,
    /// Per-stage overrides. Stage order is fixed regardless of list order.
    pub stages: Vec<StageConfig>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            max_requests_per_minute: 5,
            stages: Vec::new(),
        }
    }
}

impl AgentsConfig {
    fn stage_override(&self, kind: StageKind) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.stage == kind)
    }

    pub fn max_iterations_for(&self, kind: StageKind) -> u32 {
        self.stage_override(kind)
            .and_then(|s| s.max_iterations)
            .unwrap_or(self.max_iterations)
    }

    pub fn max_requests_per_minute_for(&self, kind: StageKind) -> u32 {
        self.stage_override(kind)
            .and_then(|s| s.max_requests_per_minute)
            .unwrap_or(self.max_requests_per_minute)
    }

    pub fn capabilities_for(&self, kind: StageKind) -> Vec<Capability> {
        self.stage_override(kind)
            .and_then(|s| s.capabilities.clone())
            .unwrap_or_else(|| kind.default_capabilities().to_vec())
    }

    pub fn model_for(&self, kind: StageKind) -> Option<String> {
        self.stage_override(kind).and_then(|s| s.model.clone())
    }
}

/// Overrides for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageConfig {
    pub stage: StageKind,
    /// Override model for this stage. Falls back to `LlmConfig::model`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub max_requests_per_minute: Option<u32>,
    /// Replaces the stage's default capability set.
    #[serde(default)]
    pub capabilities: Option<Vec<Capability>>,
}
