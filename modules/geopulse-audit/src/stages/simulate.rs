use async_trait::async_trait;
use futures::{stream, StreamExt};
use tracing::{info, warn};

use geopulse_common::{AuditConfig, PipelineError, ProviderError, SimulatedAnswer, StageError};
use geopulse_providers::{call_with_retry, GenerationRequest, RetryPolicy};

use crate::cancel::CancelToken;
use crate::mentions::MentionMatcher;
use crate::stage::{Stage, StageDeps};
use crate::state::AuditState;
use crate::stages::format_evidence;

const STAGE_NAME: &str = "simulation";

/// Simulate the target assistant's answer to every question, then extract
/// brand mentions and sentiment from each answer. A failed simulation is
/// recorded as an empty answer so the analysis stage can exclude it.
pub struct SimulationStage;

fn build_prompt(persona: &str, question: &str, evidence_block: &str) -> String {
    if evidence_block.is_empty() {
        format!(
            "No web search results are available for this question. Answer \
             from your general knowledge, as {persona} would.\n\n\
             Question: {question}\n\n\
             Answer in two to four short paragraphs, naming specific companies \
             or products where relevant."
        )
    } else {
        format!(
            "Ranked web search results:\n{evidence_block}\n\n\
             Question: {question}\n\n\
             Answer the question as {persona} would, drawing on the results \
             above where they are relevant. Answer in two to four short \
             paragraphs, naming specific companies or products where relevant."
        )
    }
}

#[async_trait]
impl Stage for SimulationStage {
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
        let matcher = MentionMatcher::new(&state.brand, &config.brand_aliases)?;
        let persona = state.target.persona();
        let system = format!(
            "You are {persona}, an AI assistant helping a consumer research a \
             purchase. Be helpful and balanced; recommend whatever genuinely \
             fits the question."
        );

        // Built eagerly so the stream owns the futures outright.
        let tasks: Vec<_> = state
            .questions
            .iter()
            .enumerate()
            .map(|(idx, question)| {
                let generator = deps.generator.clone();
                let cancel = cancel.clone();
                let prompt = build_prompt(
                    persona,
                    &question.text,
                    &format_evidence(state.evidence_for(idx)),
                );
                let request = GenerationRequest::new(&prompt)
                    .system(&system)
                    .temperature(0.7)
                    .max_tokens(1024);
                async move {
                    if cancel.is_cancelled() {
                        return (idx, Err(ProviderError::timeout("cancelled")));
                    }
                    let result = call_with_retry(policy, "answer simulation", || {
                        generator.generate(&request)
                    })
                    .await;
                    (idx, result)
                }
            })
            .collect();

        let mut results: Vec<(usize, Result<String, ProviderError>)> = stream::iter(tasks)
            .buffer_unordered(config.concurrency)
            .collect()
            .await;
        results.sort_by_key(|(idx, _)| *idx);

        cancel.check()?;

        let mut failed = 0usize;
        for (idx, result) in results {
            match result {
                Ok(text) => {
                    let text = text.trim().to_string();
                    let offsets = matcher.offsets(&text);
                    let sentiment = deps.sentiment.classify(&text);
                    state.answers.insert(
                        idx,
                        SimulatedAnswer {
                            question: idx,
                            mention_count: offsets.len(),
                            mention_offsets: offsets,
                            sentiment,
                            text,
                        },
                    );
                }
                Err(e) => {
                    warn!(question = idx, error = %e, "Simulation failed for question");
                    failed += 1;
                    state.answers.insert(idx, SimulatedAnswer::failed(idx));
                    state
                        .errors
                        .push(StageError::question(STAGE_NAME, idx, e.to_string()));
                }
            }
        }

        info!(
            answers = state.answers.len(),
            failed, "Simulation complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_evidence_when_present() {
        let prompt = build_prompt("ChatGPT", "Best CRM?", "1. [x.com] T: S");
        assert!(prompt.contains("Ranked web search results"));
        assert!(prompt.contains("Best CRM?"));
    }

    #[test]
    fn prompt_flags_missing_evidence() {
        let prompt = build_prompt("Gemini", "Best CRM?", "");
        assert!(prompt.contains("No web search results"));
    }
}
