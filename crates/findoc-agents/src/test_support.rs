//! Test support: scripted LLM clients, canned stages and a static search provider.
//!
//! `ScriptedLlm` replays a fixed list of replies and records every request, so
//! stage and pipeline behaviour can be checked without a live provider.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use findoc_models::stage::{StageInput, StageKind, StageOutput};
use tokio::sync::Mutex;

use crate::error::AgentError;
use crate::llm::{ChatRequest, LlmClient};
use crate::stage::StageAgent;
use crate::tools::{SearchHit, SearchProvider};

/// Replays replies in order. `Err` entries become `AgentError::Llm`.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<&str>) -> Self {
        Self::from_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn from_results(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError> {
        self.requests.lock().await.push(request.clone());
        match self.replies.lock().await.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(AgentError::Llm(message)),
            None => Err(AgentError::Llm("script exhausted".to_string())),
        }
    }
}

/// A stage that returns canned text (or fails) and records its inputs.
pub struct MockStage {
    kind: StageKind,
    reply: Result<String, String>,
    seen: Mutex<Vec<StageInput>>,
}

impl MockStage {
    pub fn answering(kind: StageKind, text: &str) -> Self {
        Self {
            kind,
            reply: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: StageKind, message: &str) -> Self {
        Self {
            kind,
            reply: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub async fn inputs(&self) -> Vec<StageInput> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl StageAgent for MockStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, input: &StageInput) -> Result<StageOutput, AgentError> {
        self.seen.lock().await.push(input.clone());
        match &self.reply {
            Ok(text) => Ok(StageOutput {
                stage: self.kind,
                text: text.clone(),
                rounds: 1,
                tool_calls: vec![],
            }),
            Err(message) => Err(AgentError::Llm(message.clone())),
        }
    }
}

/// Four answering stages in chain order, each replying "<stage> report".
/// Returns the concrete mocks (for inspection) and the same stages as trait objects.
pub fn standard_mock_stages() -> (Vec<Arc<MockStage>>, Vec<Arc<dyn StageAgent>>) {
    let mocks: Vec<Arc<MockStage>> = StageKind::ORDER
        .iter()
        .map(|kind| Arc::new(MockStage::answering(*kind, &format!("{kind} report"))))
        .collect();
    let stages = mocks
        .iter()
        .map(|m| Arc::clone(m) as Arc<dyn StageAgent>)
        .collect();
    (mocks, stages)
}

/// Returns fixed hits and records queries.
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    queries: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub async fn queries(&self) -> Vec<String> {
        self.queries.lock().await.clone()
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AgentError> {
        self.queries.lock().await.push(query.to_string());
        Ok(self.hits.clone())
    }
}
