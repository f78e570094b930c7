use async_trait::async_trait;
use tracing::{info, warn};

use geopulse_common::{AuditConfig, PipelineError, Sentiment, SimulatedAnswer, StageError};

use crate::cancel::CancelToken;
use crate::stage::{Stage, StageDeps};
use crate::state::AuditState;

const STAGE_NAME: &str = "analysis";

/// Deterministic scoring over the simulated answers. No provider calls;
/// the same answers always produce the same score and recommendations.
pub struct AnalysisStage;

/// Per-question sub-score.
///
/// Base 1.0 when the brand is mentioned at all, plus the position bonus
/// when the earliest mention falls in the first third of the answer,
/// minus the sentiment penalty for a negative answer, clamped to
/// [0.0, 1.0].
pub fn sub_score(answer: &SimulatedAnswer, config: &AuditConfig) -> f64 {
    if answer.mention_count == 0 {
        return 0.0;
    }
    let mut score = 1.0;
    if let Some(&first) = answer.mention_offsets.first() {
        if first < answer.text.len() / 3 {
            score += config.position_bonus;
        }
    }
    if answer.sentiment == Sentiment::Negative {
        score -= config.sentiment_penalty;
    }
    score.clamp(0.0, 1.0)
}

fn recommendations(state: &AuditState, usable: &[&SimulatedAnswer]) -> Vec<String> {
    let mut out = Vec::new();
    let total = usable.len();
    if total == 0 {
        return out;
    }

    // Rules fire independently, at most once each, in priority order:
    // visibility first, then sentiment, then placement.
    let unmentioned = usable.iter().filter(|a| a.mention_count == 0).count();
    if unmentioned > 0 {
        out.push(format!(
            "Improve visibility: {unmentioned} of {total} simulated answers never mention \
             {brand}. Publish authoritative, citable content targeting the question intents \
             where the brand is absent.",
            brand = state.brand
        ));
    }

    let negative = usable
        .iter()
        .filter(|a| a.sentiment == Sentiment::Negative)
        .count();
    if negative > 0 && negative * 3 >= total {
        out.push(format!(
            "Address negative sentiment: {negative} of {total} simulated answers frame \
             {brand} negatively. Counter the recurring criticisms with direct, sourced \
             responses so cited material skews neutral to positive.",
            brand = state.brand
        ));
    }

    let mentioned: Vec<_> = usable.iter().filter(|a| a.mention_count > 0).collect();
    let late = mentioned
        .iter()
        .filter(|a| {
            a.mention_offsets
                .first()
                .is_some_and(|&first| first >= a.text.len() / 3)
        })
        .count();
    if !mentioned.is_empty() && late * 2 >= mentioned.len() {
        out.push(format!(
            "Strengthen placement: when {brand} does appear, it appears late in the answer \
             in {late} of {count} cases. Target content at the primary sources assistants \
             cite first for these questions.",
            brand = state.brand,
            count = mentioned.len()
        ));
    }

    out
}

#[async_trait]
impl Stage for AnalysisStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    async fn run(
        &self,
        state: &mut AuditState,
        _deps: &StageDeps,
        config: &AuditConfig,
        _cancel: &CancelToken,
    ) -> Result<(), PipelineError> {
        let usable: Vec<&SimulatedAnswer> =
            state.answers.values().filter(|a| !a.is_empty()).collect();

        if usable.is_empty() {
            warn!("No usable simulations, scoring 0.0");
            state.visibility_score = Some(0.0);
            state
                .errors
                .push(StageError::stage(STAGE_NAME, "no usable simulations"));
            return Ok(());
        }

        let scores: Vec<(usize, f64)> = usable
            .iter()
            .map(|a| (a.question, sub_score(a, config)))
            .collect();
        let mean = scores.iter().map(|(_, s)| s).sum::<f64>() / scores.len() as f64;

        let recommendations = recommendations(state, &usable);

        state.question_scores = scores.into_iter().collect();
        state.visibility_score = Some(mean);
        state.recommendations = recommendations;

        info!(
            score = mean,
            scored = usable.len(),
            recommendations = state.recommendations.len(),
            "Analysis complete"
        );
        Ok(())
    }
}
