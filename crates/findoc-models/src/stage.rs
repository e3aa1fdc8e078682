use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;

/// A tool a stage may invoke.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ReadDocument,
    WebSearch,
}

impl Capability {
    /// Tool name the model uses to request this capability.
    pub fn tool_name(self) -> &'static str {
        match self {
            Capability::ReadDocument => "read_financial_document",
            Capability::WebSearch => "web_search",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        match name {
            "read_financial_document" => Some(Capability::ReadDocument),
            "web_search" => Some(Capability::WebSearch),
            _ => None,
        }
    }
}

/// The four stages of the analysis chain, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Verification,
    Analysis,
    InvestmentAdvice,
    RiskAssessment,
}

impl StageKind {
    /// Fixed execution order. Not reorderable.
    pub const ORDER: [StageKind; 4] = [
        StageKind::Verification,
        StageKind::Analysis,
        StageKind::InvestmentAdvice,
        StageKind::RiskAssessment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Verification => "verification",
            StageKind::Analysis => "analysis",
            StageKind::InvestmentAdvice => "investment_advice",
            StageKind::RiskAssessment => "risk_assessment",
        }
    }

    /// Role identity presented to the model.
    pub fn role(self) -> &'static str {
        match self {
            StageKind::Verification => "Financial Document Verification Specialist",
            StageKind::Analysis => "Senior Financial Analyst",
            StageKind::InvestmentAdvice => "Certified Investment Advisor",
            StageKind::RiskAssessment => "Financial Risk Assessment Specialist",
        }
    }

    pub fn default_capabilities(self) -> &'static [Capability] {
        match self {
            StageKind::Verification | StageKind::RiskAssessment => &[Capability::ReadDocument],
            StageKind::Analysis | StageKind::InvestmentAdvice => {
                &[Capability::ReadDocument, Capability::WebSearch]
            }
        }
    }

    /// Prior stages whose outputs this stage consumes.
    pub fn upstream(self) -> &'static [StageKind] {
        match self {
            StageKind::Verification => &[],
            StageKind::Analysis => &[StageKind::Verification],
            StageKind::InvestmentAdvice => &[StageKind::Verification, StageKind::Analysis],
            StageKind::RiskAssessment => &[StageKind::Analysis, StageKind::InvestmentAdvice],
        }
    }

    /// Position in [`StageKind::ORDER`].
    pub fn position(self) -> usize {
        match self {
            StageKind::Verification => 0,
            StageKind::Analysis => 1,
            StageKind::InvestmentAdvice => 2,
            StageKind::RiskAssessment => 3,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a stage is given to do its work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageInput {
    pub query: String,
    pub document: DocumentRef,
    /// Outputs of the stages listed in [`StageKind::upstream`], in chain order.
    pub upstream: Vec<StageOutput>,
}

impl StageInput {
    pub fn upstream_output(&self, kind: StageKind) -> Option<&StageOutput> {
        self.upstream.iter().find(|o| o.stage == kind)
    }
}

/// Text produced by one stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageOutput {
    pub stage: StageKind,
    pub text: String,
    /// LLM calls made while producing this output.
    pub rounds: u32,
    /// Names of tools invoked, in call order.
    pub tool_calls: Vec<String>,
}
