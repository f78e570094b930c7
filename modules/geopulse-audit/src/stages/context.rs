use async_trait::async_trait;
use tracing::{info, warn};

use geopulse_common::util::truncate_to_char_boundary;
use geopulse_common::{AuditConfig, PipelineError, StageError};
use geopulse_providers::{call_with_retry, GenerationRequest, RetryPolicy};

use crate::cancel::CancelToken;
use crate::stage::{Stage, StageDeps};
use crate::state::AuditState;
use crate::stages::format_evidence;

const STAGE_NAME: &str = "brand_context";

const CONTEXT_SYSTEM_PROMPT: &str = "You are a market research assistant. \
Summarize only what the provided material supports; do not speculate or \
pad with generic statements.";

/// Build a short factual profile of the brand. Web results ground the
/// summary when search is available; the stage is best-effort and never
/// fails the run.
pub struct BrandContextStage;

#[async_trait]
impl Stage for BrandContextStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    async fn run(
        &self,
        state: &mut AuditState,
        deps: &StageDeps,
        config: &AuditConfig,
        _cancel: &CancelToken,
    ) -> Result<(), PipelineError> {
        let policy = RetryPolicy::from_config(config);

        let query = format!("{} company products services", state.brand);
        let grounding = match call_with_retry(policy, "context search", || {
            deps.searcher.search(&query, config.max_search_results)
        })
        .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "Context grounding search failed, summarizing without it");
                Vec::new()
            }
        };

        let prompt = if grounding.is_empty() {
            format!(
                "Write a brief factual profile of the company or brand \"{}\": \
                 what it does, its main products or services, and its market. \
                 Keep it under 150 words. If you do not know the brand, say so \
                 in one sentence.",
                state.brand
            )
        } else {
            format!(
                "Using only the search results below, write a brief factual \
                 profile of the company or brand \"{}\": what it does, its main \
                 products or services, and its market. Keep it under 150 words.\n\n\
                 Search results:\n{}",
                state.brand,
                format_evidence(&grounding)
            )
        };

        let request = GenerationRequest::new(&prompt)
            .system(CONTEXT_SYSTEM_PROMPT)
            .temperature(0.3)
            .max_tokens(512);

        match call_with_retry(policy, "context summary", || deps.generator.generate(&request))
            .await
        {
            Ok(summary) => {
                let summary = summary.trim();
                let bounded = truncate_to_char_boundary(summary, config.context_max_chars);
                if bounded.len() < summary.len() {
                    info!(
                        from = summary.len(),
                        to = bounded.len(),
                        "Brand context truncated"
                    );
                }
                state.brand_context = Some(bounded.to_string());
            }
            Err(e) => {
                warn!(error = %e, "Brand context generation failed, continuing without context");
                state
                    .errors
                    .push(StageError::stage(STAGE_NAME, &format!("context unavailable: {e}")));
                state.brand_context = Some(String::new());
            }
        }

        Ok(())
    }
}
