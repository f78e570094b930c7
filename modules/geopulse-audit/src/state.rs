use std::collections::BTreeMap;

use serde::Serialize;

use geopulse_common::{
    Evidence, PipelineError, Question, SimulatedAnswer, StageError, TargetProvider,
};

/// The shared document every stage reads from and appends to.
///
/// Per-question collections are keyed by the question's index in
/// `questions` so partial results stay joinable after failures, and
/// `BTreeMap` keeps iteration order deterministic.
#[derive(Debug, Clone, Serialize)]
pub struct AuditState {
    pub brand: String,
    pub target: TargetProvider,
    /// Set by the brand-context stage; empty when grounding failed.
    pub brand_context: Option<String>,
    pub questions: Vec<Question>,
    pub evidence: BTreeMap<usize, Vec<Evidence>>,
    pub answers: BTreeMap<usize, SimulatedAnswer>,
    pub question_scores: BTreeMap<usize, f64>,
    pub visibility_score: Option<f64>,
    pub recommendations: Vec<String>,
    /// Recoverable trouble accumulated along the way. Never cleared.
    pub errors: Vec<StageError>,
}

impl AuditState {
    pub fn new(brand: &str, target: TargetProvider) -> Result<Self, PipelineError> {
        let brand = brand.trim();
        if brand.is_empty() {
            return Err(PipelineError::InvalidInput(
                "brand name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            brand: brand.to_string(),
            target,
            brand_context: None,
            questions: Vec::new(),
            evidence: BTreeMap::new(),
            answers: BTreeMap::new(),
            question_scores: BTreeMap::new(),
            visibility_score: None,
            recommendations: Vec::new(),
            errors: Vec::new(),
        })
    }

    /// Evidence gathered for question `index`, empty slice when the
    /// search for it failed or returned nothing.
    pub fn evidence_for(&self, index: usize) -> &[Evidence] {
        self.evidence.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_brand_is_rejected() {
        let err = AuditState::new("   ", TargetProvider::ChatGpt).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn brand_is_trimmed() {
        let state = AuditState::new("  Acme  ", TargetProvider::Gemini).unwrap();
        assert_eq!(state.brand, "Acme");
        assert!(state.visibility_score.is_none());
    }
}
