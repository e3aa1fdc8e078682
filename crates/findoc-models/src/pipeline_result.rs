use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::DocumentRef;
use crate::stage::StageKind;

/// Outcome of a full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub query: String,
    pub document: DocumentRef,
    /// Text produced by the final stage.
    pub report: String,
    pub stages: Vec<StageReport>,
    pub started_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl PipelineResult {
    pub fn stage(&self, kind: StageKind) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == kind)
    }
}

/// Per-stage summary kept alongside the final report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageReport {
    pub stage: StageKind,
    pub role: String,
    pub output: String,
    pub rounds: u32,
    pub tool_calls: Vec<String>,
    pub elapsed_ms: u64,
}
