use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use geopulse_common::{Sentiment, StageError, TargetProvider};

use crate::state::AuditState;

/// The caller-facing projection of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub brand: String,
    pub target: TargetProvider,
    /// Aggregate visibility in [0.0, 1.0].
    pub score: f64,
    pub recommendations: Vec<String>,
    /// Recoverable trouble encountered along the way.
    pub warnings: Vec<StageError>,
    pub questions: Vec<QuestionBreakdown>,
}

/// Per-question detail backing the aggregate score.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionBreakdown {
    pub index: usize,
    pub text: String,
    pub intent: String,
    pub evidence_count: usize,
    /// False when the simulation failed and the question was excluded
    /// from the score.
    pub answered: bool,
    /// Length of the simulated answer in bytes.
    pub answer_len: usize,
    pub mention_count: usize,
    pub first_mention: Option<usize>,
    pub sentiment: Sentiment,
    pub sub_score: Option<f64>,
}

impl AuditReport {
    pub fn from_state(state: &AuditState) -> Self {
        let questions = state
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let answer = state.answers.get(&index);
                QuestionBreakdown {
                    index,
                    text: question.text.clone(),
                    intent: question.intent.clone(),
                    evidence_count: state.evidence_for(index).len(),
                    answered: answer.is_some_and(|a| !a.is_empty()),
                    answer_len: answer.map(|a| a.text.len()).unwrap_or(0),
                    mention_count: answer.map(|a| a.mention_count).unwrap_or(0),
                    first_mention: answer.and_then(|a| a.mention_offsets.first().copied()),
                    sentiment: answer.map(|a| a.sentiment).unwrap_or_default(),
                    sub_score: state.question_scores.get(&index).copied(),
                }
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            brand: state.brand.clone(),
            target: state.target,
            score: state.visibility_score.unwrap_or(0.0),
            recommendations: state.recommendations.clone(),
            warnings: state.errors.clone(),
            questions,
        }
    }
}
