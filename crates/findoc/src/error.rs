use std::path::PathBuf;

use findoc_agents::{AgentError, PipelineError};
use findoc_extract::ExtractError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FindocError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input file not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("Sample file not found at: {}", .0.display())]
    SampleMissing(PathBuf),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}
