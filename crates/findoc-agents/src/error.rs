use findoc_models::stage::StageKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM call timed out after {0} seconds")]
    Timeout(u64),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Stage {stage} reached its limit of {max_iterations} rounds without a final answer")]
    IterationLimit {
        stage: StageKind,
        max_iterations: u32,
    },

    #[error("Stage {stage} needs the output of {upstream}, which is missing")]
    MissingUpstream {
        stage: StageKind,
        upstream: StageKind,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage {stage} failed: {source}")]
    StageFailure {
        stage: StageKind,
        #[source]
        source: AgentError,
    },

    #[error("Invalid stage chain: {0}")]
    InvalidStages(String),

    #[error("Pipeline task failed: {0}")]
    Join(String),
}

impl PipelineError {
    /// The stage that aborted the run, if any.
    pub fn failed_stage(&self) -> Option<StageKind> {
        match self {
            PipelineError::StageFailure { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
