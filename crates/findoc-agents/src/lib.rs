pub mod claude_cli;
pub mod error;
pub mod llm;
pub mod openai_compat;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod rate_limit;
pub mod stage;
pub mod tools;

pub mod test_support;

pub use claude_cli::ClaudeCliClient;
pub use error::{AgentError, PipelineError};
pub use llm::{ChatMessage, ChatRequest, LlmClient, Role};
pub use openai_compat::OpenAiCompatClient;
pub use pipeline::{Pipeline, DEFAULT_QUERY};
pub use rate_limit::RateLimiter;
pub use stage::{LlmStage, StageAgent, StageSettings};
pub use tools::{ReadDocumentTool, SearchProvider, SerperSearch, Tool, Toolbox, WebSearchTool};
