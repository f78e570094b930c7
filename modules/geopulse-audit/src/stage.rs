use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info};

use geopulse_common::{AuditConfig, PipelineError};
use geopulse_providers::{TextGenerator, WebSearcher};

use crate::cancel::CancelToken;
use crate::sentiment::SentimentClassifier;
use crate::stages::{
    AnalysisStage, BrandContextStage, QuestionGenStage, SearchStage, SimulationStage,
};
use crate::state::AuditState;

/// Capabilities injected into every stage. Adapters hide behind traits so
/// tests run the full pipeline against in-memory stubs.
#[derive(Clone)]
pub struct StageDeps {
    pub generator: Arc<dyn TextGenerator>,
    pub searcher: Arc<dyn WebSearcher>,
    pub sentiment: Arc<dyn SentimentClassifier>,
}

/// One step of the audit. Stages own no state; everything they produce
/// lands in the shared `AuditState`.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(
        &self,
        state: &mut AuditState,
        deps: &StageDeps,
        config: &AuditConfig,
        cancel: &CancelToken,
    ) -> Result<(), PipelineError>;
}

/// Ordered stage list. The executor checks for cancellation between
/// stages and stops on the first fatal error.
pub struct AuditPipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl AuditPipeline {
    /// The standard five-stage audit.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Box::new(BrandContextStage),
                Box::new(QuestionGenStage),
                Box::new(SearchStage),
                Box::new(SimulationStage),
                Box::new(AnalysisStage),
            ],
        }
    }

    pub async fn run(
        &self,
        state: &mut AuditState,
        deps: &StageDeps,
        config: &AuditConfig,
        cancel: &CancelToken,
    ) -> Result<(), PipelineError> {
        let run_started = Instant::now();
        info!(brand = %state.brand, target = %state.target, "Audit run starting");

        for stage in &self.stages {
            cancel.check()?;

            let started = Instant::now();
            match stage.run(state, deps, config, cancel).await {
                Ok(()) => {
                    info!(
                        stage = stage.name(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        warnings = state.errors.len(),
                        "Stage complete"
                    );
                }
                Err(e) => {
                    error!(stage = stage.name(), error = %e, "Stage failed, aborting run");
                    return Err(e);
                }
            }
        }

        info!(
            brand = %state.brand,
            score = state.visibility_score.unwrap_or(0.0),
            elapsed_ms = run_started.elapsed().as_millis() as u64,
            "Audit run complete"
        );
        Ok(())
    }
}
