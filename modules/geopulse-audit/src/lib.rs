//! The staged audit pipeline.
//!
//! An audit run threads one `AuditState` through five ordered stages:
//! brand context, question generation, search, simulation, analysis.
//! Each stage is a function of (state, capabilities, config); per-question
//! work inside the search and simulation stages fans out concurrently.
//!
//! The single entry point for collaborators (REST layer, CLI) is
//! [`run_audit`].

pub mod cancel;
pub mod mentions;
pub mod report;
pub mod sentiment;
pub mod stage;
pub mod stages;
pub mod state;

pub use cancel::CancelToken;
pub use report::{AuditReport, QuestionBreakdown};
pub use sentiment::{LexiconSentiment, SentimentClassifier};
pub use stage::{AuditPipeline, Stage, StageDeps};
pub use state::AuditState;

use geopulse_common::{AuditConfig, PipelineError, TargetProvider};

/// Run one complete audit for `brand` against the given target persona.
///
/// A completed run always yields a report (score in [0.0, 1.0] plus a
/// warnings list); only total-loss conditions (zero questions, unknown
/// provider, cancellation, invalid input) surface as `PipelineError`.
pub async fn run_audit(
    brand: &str,
    target: TargetProvider,
    config: &AuditConfig,
    deps: &StageDeps,
    cancel: &CancelToken,
) -> Result<AuditReport, PipelineError> {
    let mut state = AuditState::new(brand, target)?;
    AuditPipeline::standard()
        .run(&mut state, deps, config, cancel)
        .await?;
    Ok(AuditReport::from_state(&state))
}
