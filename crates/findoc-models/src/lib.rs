pub mod config;
pub mod document;
pub mod pipeline_result;
pub mod stage;

pub use config::{
    AgentsConfig, ExtractorConfig, FindocConfig, LlmConfig, LlmProvider, SearchConfig,
    StageConfig,
};
pub use document::{DocumentRef, ExtractionResult, PageRecord};
pub use pipeline_result::{PipelineResult, StageReport};
pub use stage::{Capability, StageInput, StageKind, StageOutput};
