use async_trait::async_trait;
use futures::{stream, StreamExt};
use tracing::{debug, info, warn};

use geopulse_common::{AuditConfig, Evidence, PipelineError, ProviderError, StageError};
use geopulse_providers::{call_with_retry, RetryPolicy};

use crate::cancel::CancelToken;
use crate::stage::{Stage, StageDeps};
use crate::state::AuditState;

const STAGE_NAME: &str = "search";

/// Gather evidence for every question concurrently. A failed search
/// leaves that question with an empty evidence set and a warning; the
/// stage itself always succeeds.
pub struct SearchStage;

#[async_trait]
impl Stage for SearchStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    async fn run(
        &self,
        state: &mut AuditState,
        deps: &StageDeps,
        config: &AuditConfig,
        cancel: &CancelToken,
    ) -> Result<(), PipelineError> {
        let policy = RetryPolicy::from_config(config);
        let limit = config.max_search_results;

        // Built eagerly so the stream owns the futures outright.
        let tasks: Vec<_> = state
            .questions
            .iter()
            .enumerate()
            .map(|(idx, question)| {
                let searcher = deps.searcher.clone();
                let query = question.text.clone();
                let cancel = cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        return (idx, Ok(Vec::new()));
                    }
                    let result = call_with_retry(policy, "web search", || {
                        searcher.search(&query, limit)
                    })
                    .await;
                    (idx, result)
                }
            })
            .collect();

        let mut results: Vec<(usize, Result<Vec<Evidence>, ProviderError>)> = stream::iter(tasks)
            .buffer_unordered(config.concurrency)
            .collect()
            .await;
        // buffer_unordered yields in completion order; restore question
        // order so warnings and logs are reproducible.
        results.sort_by_key(|(idx, _)| *idx);

        let mut failed = 0usize;
        for (idx, result) in results {
            match result {
                Ok(raw) => {
                    let kept: Vec<Evidence> = raw
                        .into_iter()
                        .filter(|e| !e.title.trim().is_empty() && !e.snippet.trim().is_empty())
                        .take(limit)
                        .collect();
                    debug!(question = idx, count = kept.len(), "Evidence stored");
                    state.evidence.insert(idx, kept);
                }
                Err(e) => {
                    warn!(question = idx, error = %e, "Search failed for question");
                    failed += 1;
                    state.evidence.insert(idx, Vec::new());
                    state
                        .errors
                        .push(StageError::question(STAGE_NAME, idx, e.to_string()));
                }
            }
        }

        cancel.check()?;
        info!(
            questions = state.questions.len(),
            failed, "Evidence gathering complete"
        );
        Ok(())
    }
}
