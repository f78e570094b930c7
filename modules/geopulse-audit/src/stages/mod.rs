//! The five audit stages, in pipeline order.

mod analyze;
mod context;
mod questions;
mod search;
mod simulate;

pub use analyze::{sub_score, AnalysisStage};
pub use context::BrandContextStage;
pub use questions::QuestionGenStage;
pub use search::SearchStage;
pub use simulate::SimulationStage;

use geopulse_common::Evidence;

/// Render evidence as a numbered block for prompt interpolation.
pub(crate) fn format_evidence(evidence: &[Evidence]) -> String {
    evidence
        .iter()
        .map(|e| format!("{}. [{}] {}: {}", e.rank, e.domain, e.title, e.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}
