//! findoc - financial document analyzer
//!
//! Extracts text from financial PDFs and runs it through a fixed chain of
//! LLM-backed stages: verification, analysis, investment advice and risk
//! assessment. The final stage's report is the answer.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use findoc::{Analyzer, Credentials};
//! use findoc::models::config::FindocConfig;
//!
//! # async fn run() -> Result<(), findoc::FindocError> {
//! let analyzer = Analyzer::from_config(&FindocConfig::default(), &Credentials::from_env())?;
//! let result = analyzer.analyze_sample("Is the company profitable?").await?;
//! println!("{}", result.report);
//! # Ok(())
//! # }
//! ```

pub use findoc_agents as agents;
pub use findoc_extract as extract;
pub use findoc_models as models;

pub mod error;
pub mod staging;

pub use error::FindocError;
pub use staging::StagedUpload;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use findoc_agents::claude_cli::ClaudeCliConfig;
use findoc_agents::{
    AgentError, ClaudeCliClient, LlmClient, OpenAiCompatClient, Pipeline, ReadDocumentTool,
    SerperSearch, Toolbox, WebSearchTool,
};
use findoc_extract::Extractor;
use findoc_models::config::{FindocConfig, LlmConfig, LlmProvider, SearchConfig};
use findoc_models::pipeline_result::PipelineResult;
use tracing::{info, warn};

/// API keys, read once at startup and passed down explicitly.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name lookup. Blank values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            groq_api_key: get("GROQ_API_KEY"),
            gemini_api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            serper_api_key: get("SERPER_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
        }
    }
}

/// Load configuration. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<FindocConfig, FindocError> {
    if !path.exists() {
        info!(path = %path.display(), "No config file, using defaults");
        return Ok(FindocConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw)
        .map_err(|e| FindocError::Config(format!("Failed to parse {}: {e}", path.display())))
}

/// Pick and construct the chat backend.
pub fn build_llm_client(
    config: &LlmConfig,
    credentials: &Credentials,
) -> Result<Arc<dyn LlmClient>, AgentError> {
    let timeout = Duration::from_secs(config.call_timeout_seconds);
    let model = Some(config.model.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Auto => {
            if let Some(key) = &credentials.groq_api_key {
                Arc::new(
                    OpenAiCompatClient::groq(key, model, timeout)
                        .with_temperature(config.temperature),
                )
            } else if let Some(key) = &credentials.gemini_api_key {
                Arc::new(
                    OpenAiCompatClient::gemini(key, model, timeout)
                        .with_temperature(config.temperature),
                )
            } else {
                return Err(AgentError::Config(
                    "No API key found! Set GROQ_API_KEY or GEMINI_API_KEY (or GOOGLE_API_KEY) \
                     in the environment or a .env file"
                        .to_string(),
                ));
            }
        }
        LlmProvider::Groq => {
            let key = required(&credentials.groq_api_key, "groq", "GROQ_API_KEY")?;
            Arc::new(
                OpenAiCompatClient::groq(key, model, timeout).with_temperature(config.temperature),
            )
        }
        LlmProvider::Gemini => {
            let key = required(
                &credentials.gemini_api_key,
                "gemini",
                "GEMINI_API_KEY or GOOGLE_API_KEY",
            )?;
            Arc::new(
                OpenAiCompatClient::gemini(key, model, timeout)
                    .with_temperature(config.temperature),
            )
        }
        LlmProvider::ClaudeCli => {
            let defaults = ClaudeCliConfig::default();
            Arc::new(ClaudeCliClient::new(ClaudeCliConfig {
                model: model.unwrap_or_else(|| defaults.model.clone()),
                timeout,
                ..defaults
            }))
        }
        LlmProvider::OpenaiCompat => {
            let base_url = config.base_url.trim();
            if base_url.is_empty() {
                return Err(AgentError::Config(
                    "provider openai_compat requires llm.base_url".to_string(),
                ));
            }
            let model = model.ok_or_else(|| {
                AgentError::Config("provider openai_compat requires llm.model".to_string())
            })?;
            let key = credentials.openai_api_key.clone().unwrap_or_default();
            Arc::new(
                OpenAiCompatClient::new("openai_compat", base_url, key, model, timeout)
                    .with_temperature(config.temperature),
            )
        }
    };

    info!(provider = ?config.provider, model = client.model(), "LLM client ready");
    Ok(client)
}

fn required<'a>(
    key: &'a Option<String>,
    provider: &str,
    variable: &str,
) -> Result<&'a str, AgentError> {
    key.as_deref().ok_or_else(|| {
        AgentError::Config(format!("provider {provider} requires {variable} to be set"))
    })
}

/// Register the document reader, plus web search when enabled and keyed.
pub fn build_toolbox(
    extractor: &Arc<Extractor>,
    search: &SearchConfig,
    credentials: &Credentials,
) -> Toolbox {
    let toolbox = Toolbox::new().with(Arc::new(ReadDocumentTool::new(Arc::clone(extractor))));

    match (&credentials.serper_api_key, search.enabled) {
        (Some(key), true) => {
            let provider = SerperSearch::new(&search.endpoint, key, search.max_results);
            toolbox.with(Arc::new(WebSearchTool::new(Arc::new(provider))))
        }
        (None, true) => {
            warn!("SERPER_API_KEY not set, web search disabled");
            toolbox
        }
        (_, false) => toolbox,
    }
}

/// Extractor plus pipeline: everything a run needs.
pub struct Analyzer {
    extractor: Arc<Extractor>,
    pipeline: Arc<Pipeline>,
}

impl Analyzer {
    pub fn new(extractor: Arc<Extractor>, pipeline: Arc<Pipeline>) -> Self {
        Self {
            extractor,
            pipeline,
        }
    }

    pub fn from_config(
        config: &FindocConfig,
        credentials: &Credentials,
    ) -> Result<Self, FindocError> {
        let extractor = Arc::new(Extractor::new(config.extractor.clone()));
        let llm = build_llm_client(&config.llm, credentials)?;
        let toolbox = build_toolbox(&extractor, &config.search, credentials);
        let pipeline = Pipeline::from_config(llm, &toolbox, &config.agents)?;
        Ok(Self::new(extractor, Arc::new(pipeline)))
    }

    /// Analyze a caller-supplied file through a staged copy that is removed afterwards.
    pub async fn analyze_file(
        &self,
        file: &Path,
        query: &str,
    ) -> Result<PipelineResult, FindocError> {
        if !file.is_file() {
            return Err(FindocError::InputMissing(file.to_path_buf()));
        }
        let documents_dir = PathBuf::from(&self.extractor.config().documents_dir);
        let staged = StagedUpload::stage(file, &documents_dir)?;
        let result = self.run_on(staged.path(), query).await;
        drop(staged);
        result
    }

    /// Analyze the bundled sample document in the documents directory.
    pub async fn analyze_sample(&self, query: &str) -> Result<PipelineResult, FindocError> {
        let config = self.extractor.config();
        let sample = Path::new(&config.documents_dir).join(&config.fallback_file);
        if !sample.is_file() {
            return Err(FindocError::SampleMissing(sample));
        }
        self.run_on(&sample, query).await
    }

    async fn run_on(&self, path: &Path, query: &str) -> Result<PipelineResult, FindocError> {
        let extractor = Arc::clone(&self.extractor);
        let target = path.to_path_buf();
        let document = tokio::task::spawn_blocking(move || extractor.resolve(&target))
            .await
            .map_err(|e| FindocError::Task(e.to_string()))??;

        info!(
            document = %document.path().display(),
            pages = document.total_pages,
            "Analyzing document"
        );
        Ok(self.pipeline.run_detached(query.to_string(), document).await?)
    }
}
