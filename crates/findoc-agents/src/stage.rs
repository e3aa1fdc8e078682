use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use findoc_models::config::AgentsConfig;
use findoc_models::document::DocumentRef;
use findoc_models::stage::{Capability, StageInput, StageKind, StageOutput};
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::llm::{ChatMessage, ChatRequest, LlmClient};
use crate::parser::{parse_turn, AgentTurn};
use crate::prompts;
use crate::rate_limit::RateLimiter;
use crate::tools::{Tool, Toolbox};

/// One stage of the pipeline. Mockable for testing.
#[async_trait]
pub trait StageAgent: Send + Sync {
    fn kind(&self) -> StageKind;

    async fn run(&self, input: &StageInput) -> Result<StageOutput, AgentError>;
}

/// Cost and capability bounds for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSettings {
    pub max_iterations: u32,
    pub max_requests_per_minute: u32,
    pub capabilities: Vec<Capability>,
    pub model: Option<String>,
}

impl StageSettings {
    pub fn defaults(kind: StageKind) -> Self {
        Self::from_config(kind, &AgentsConfig::default())
    }

    pub fn from_config(kind: StageKind, config: &AgentsConfig) -> Self {
        Self {
            max_iterations: config.max_iterations_for(kind),
            max_requests_per_minute: config.max_requests_per_minute_for(kind),
            capabilities: config.capabilities_for(kind),
            model: config.model_for(kind),
        }
    }
}

/// A stage that runs a bounded tool loop against an LLM.
pub struct LlmStage {
    kind: StageKind,
    settings: StageSettings,
    llm: Arc<dyn LlmClient>,
    tools: Vec<Arc<dyn Tool>>,
    limiter: RateLimiter,
}

impl LlmStage {
    pub fn new(
        kind: StageKind,
        settings: StageSettings,
        llm: Arc<dyn LlmClient>,
        toolbox: &Toolbox,
    ) -> Self {
        let tools = toolbox.for_capabilities(&settings.capabilities);
        let limiter = RateLimiter::per_minute(settings.max_requests_per_minute);
        Self {
            kind,
            settings,
            llm,
            tools,
            limiter,
        }
    }

    /// Tool names this stage can actually call.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    async fn call_tool(
        &self,
        name: &str,
        input: &serde_json::Value,
        document: &DocumentRef,
    ) -> String {
        let capability = match Capability::from_tool_name(name) {
            Some(c) => c,
            None => {
                return format!(
                    "ERROR: unknown tool '{name}'. Available tools: [{}]",
                    self.tool_names().join(", ")
                )
            }
        };

        if !self.settings.capabilities.contains(&capability) {
            warn!(stage = %self.kind, tool = name, "Tool outside capability set requested");
            return format!("ERROR: tool '{name}' is not permitted for the {} stage", self.kind);
        }

        let tool = match self.tools.iter().find(|t| t.capability() == capability) {
            Some(t) => t,
            None => return format!("ERROR: tool '{name}' is not available in this deployment"),
        };

        let start = Instant::now();
        let output = match tool.call(input, document).await {
            Ok(text) => text,
            Err(e) => format!("ERROR: {e}"),
        };
        debug!(
            stage = %self.kind,
            tool = name,
            chars = output.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tool call finished"
        );
        output
    }
}

#[async_trait]
impl StageAgent for LlmStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, input: &StageInput) -> Result<StageOutput, AgentError> {
        for upstream in self.kind.upstream() {
            if input.upstream_output(*upstream).is_none() {
                return Err(AgentError::MissingUpstream {
                    stage: self.kind,
                    upstream: *upstream,
                });
            }
        }

        // A single round leaves no room for an observation, so tools are not offered.
        let max_iterations = self.settings.max_iterations.max(1);
        let offered: &[Arc<dyn Tool>] = if max_iterations > 1 { &self.tools } else { &[] };
        let mut messages = vec![
            ChatMessage::system(prompts::system_prompt(self.kind, offered)),
            ChatMessage::user(prompts::user_prompt(input)),
        ];
        let mut tool_calls = Vec::new();

        for round in 1..=max_iterations {
            let last_round = round == max_iterations;
            if last_round && round > 1 {
                messages.push(ChatMessage::user(prompts::FINAL_ROUND_NOTICE));
            }

            self.limiter.acquire().await;
            debug!(stage = %self.kind, round, "Calling LLM");
            let request = ChatRequest {
                model: self.settings.model.clone(),
                messages: messages.clone(),
            };
            let raw = self.llm.complete(&request).await?;

            match parse_turn(&raw) {
                AgentTurn::Final(text) => {
                    info!(
                        stage = %self.kind,
                        rounds = round,
                        tools = tool_calls.len(),
                        "Stage answered"
                    );
                    return Ok(StageOutput {
                        stage: self.kind,
                        text,
                        rounds: round,
                        tool_calls,
                    });
                }
                AgentTurn::ToolCall { tool, input: args } => {
                    if last_round {
                        break;
                    }
                    let observation = self.call_tool(&tool, &args, &input.document).await;
                    messages.push(ChatMessage::assistant(raw));
                    messages.push(ChatMessage::user(prompts::observation(&tool, &observation)));
                    tool_calls.push(tool);
                }
            }
        }

        Err(AgentError::IterationLimit {
            stage: self.kind,
            max_iterations,
        })
    }
}
