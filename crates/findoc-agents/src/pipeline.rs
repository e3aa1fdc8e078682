use std::sync::Arc;
use std::time::Instant;

use findoc_models::config::AgentsConfig;
use findoc_models::document::DocumentRef;
use findoc_models::pipeline_result::{PipelineResult, StageReport};
use findoc_models::stage::{StageInput, StageKind, StageOutput};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::llm::LlmClient;
use crate::stage::{LlmStage, StageAgent, StageSettings};
use crate::tools::Toolbox;

/// Used when the caller supplies a blank query.
pub const DEFAULT_QUERY: &str = "Analyze this financial document for investment insights";

pub fn normalize_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Runs the four analysis stages strictly in order.
pub struct Pipeline {
    stages: Vec<Arc<dyn StageAgent>>,
}

impl Pipeline {
    /// Accepts exactly one stage per kind, in [`StageKind::ORDER`].
    pub fn new(stages: Vec<Arc<dyn StageAgent>>) -> Result<Self, PipelineError> {
        let kinds: Vec<StageKind> = stages.iter().map(|s| s.kind()).collect();
        if kinds != StageKind::ORDER {
            return Err(PipelineError::InvalidStages(format!(
                "expected [{}], got [{}]",
                join_kinds(&StageKind::ORDER),
                join_kinds(&kinds)
            )));
        }
        Ok(Self { stages })
    }

    /// Build the standard chain of LLM-backed stages.
    pub fn from_config(
        llm: Arc<dyn LlmClient>,
        toolbox: &Toolbox,
        config: &AgentsConfig,
    ) -> Result<Self, PipelineError> {
        let stages = StageKind::ORDER
            .iter()
            .map(|kind| {
                Arc::new(LlmStage::new(
                    *kind,
                    StageSettings::from_config(*kind, config),
                    Arc::clone(&llm),
                    toolbox,
                )) as Arc<dyn StageAgent>
            })
            .collect();
        Self::new(stages)
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    /// Run every stage in order. The first failing stage aborts the run.
    pub async fn run(
        &self,
        query: &str,
        document: &DocumentRef,
    ) -> Result<PipelineResult, PipelineError> {
        let query = normalize_query(query);
        let run_id = Uuid::new_v4();
        let started_at = chrono::Utc::now();
        let start = Instant::now();
        info!(
            %run_id,
            document = %document.path().display(),
            pages = document.total_pages,
            "Pipeline started"
        );

        let mut outputs: Vec<StageOutput> = Vec::with_capacity(self.stages.len());
        let mut reports: Vec<StageReport> = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let kind = stage.kind();
            let upstream = kind
                .upstream()
                .iter()
                .filter_map(|up| outputs.iter().find(|o| o.stage == *up).cloned())
                .collect();
            let input = StageInput {
                query: query.clone(),
                document: document.clone(),
                upstream,
            };

            info!(%run_id, stage = %kind, "Stage started");
            let stage_start = Instant::now();
            let output = stage.run(&input).await.map_err(|source| {
                error!(
                    %run_id,
                    stage = %kind,
                    error = %source,
                    elapsed_ms = stage_start.elapsed().as_millis() as u64,
                    "Stage failed, aborting run"
                );
                PipelineError::StageFailure {
                    stage: kind,
                    source,
                }
            })?;
            let elapsed_ms = stage_start.elapsed().as_millis() as u64;
            info!(%run_id, stage = %kind, rounds = output.rounds, elapsed_ms, "Stage complete");

            reports.push(StageReport {
                stage: kind,
                role: kind.role().to_string(),
                output: output.text.clone(),
                rounds: output.rounds,
                tool_calls: output.tool_calls.clone(),
                elapsed_ms,
            });
            outputs.push(output);
        }

        let report = outputs.last().map(|o| o.text.clone()).unwrap_or_default();
        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(%run_id, processing_time_ms, "Pipeline complete");

        Ok(PipelineResult {
            run_id,
            query,
            document: document.clone(),
            report,
            stages: reports,
            started_at,
            processing_time_ms,
        })
    }

    /// Run on a separate tokio task so the caller's task is not tied up by the run.
    pub async fn run_detached(
        self: &Arc<Self>,
        query: String,
        document: DocumentRef,
    ) -> Result<PipelineResult, PipelineError> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.run(&query, &document).await })
            .await
            .map_err(|e| PipelineError::Join(e.to_string()))?
    }
}

fn join_kinds(kinds: &[StageKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{standard_mock_stages, MockStage};

    #[test]
    fn blank_query_gets_default() {
        assert_eq!(normalize_query("   "), DEFAULT_QUERY);
        assert_eq!(normalize_query("  Is it profitable? "), "Is it profitable?");
    }

    #[test]
    fn rejects_reordered_stages() {
        let mut stages = standard_mock_stages().1;
        stages.swap(1, 2);
        let err = Pipeline::new(stages).err().unwrap();
        assert!(matches!(err, PipelineError::InvalidStages(_)));
        let expected = "got [verification, investment_advice, analysis, risk_assessment]";
        assert!(err.to_string().contains(expected));
    }

    #[test]
    fn rejects_incomplete_chain() {
        let stages: Vec<Arc<dyn StageAgent>> = vec![
            Arc::new(MockStage::answering(StageKind::Verification, "ok")),
            Arc::new(MockStage::answering(StageKind::Analysis, "ok")),
        ];
        assert!(Pipeline::new(stages).is_err());
    }

    #[tokio::test]
    async fn report_is_final_stage_output() {
        let (_mocks, stages) = standard_mock_stages();
        let pipeline = Pipeline::new(stages).unwrap();
        let doc = DocumentRef::new("/tmp/q.pdf", 3);

        let result = pipeline.run("", &doc).await.unwrap();
        assert_eq!(result.query, DEFAULT_QUERY);
        assert_eq!(result.report, "risk_assessment report");
        assert_eq!(
            result.stages.iter().map(|s| s.stage).collect::<Vec<_>>(),
            StageKind::ORDER.to_vec()
        );
    }

    #[tokio::test]
    async fn run_detached_returns_result() {
        let (_mocks, stages) = standard_mock_stages();
        let pipeline = Arc::new(Pipeline::new(stages).unwrap());

        let result = pipeline
            .run_detached("q".to_string(), DocumentRef::new("/tmp/q.pdf", 3))
            .await
            .unwrap();
        assert_eq!(result.stages.len(), 4);
    }
}
