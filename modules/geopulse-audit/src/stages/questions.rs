use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use geopulse_common::util::strip_code_blocks;
use geopulse_common::{AuditConfig, PipelineError, Question, StageError};
use geopulse_providers::{call_with_retry, GenerationRequest, RetryPolicy};

use crate::cancel::CancelToken;
use crate::stage::{Stage, StageDeps};
use crate::state::AuditState;

const STAGE_NAME: &str = "question_generation";

const QUESTION_SYSTEM_PROMPT: &str = "You generate realistic questions that \
ordinary consumers ask AI assistants when researching a product category. \
Questions must be category-level: never name the brand itself. Respond with \
a JSON array only, no prose.";

/// Generate the N audit questions. Zero accepted questions after one
/// corrective re-prompt is fatal; every later stage needs them.
pub struct QuestionGenStage;

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    text: String,
    #[serde(default)]
    intent: String,
}

fn build_prompt(brand: &str, context: &str, count: usize, avoid: &[String]) -> String {
    let mut prompt = format!(
        "Generate exactly {count} distinct questions a consumer might ask an AI \
         assistant when researching the product category that \"{brand}\" \
         operates in. Cover varied intents (comparison, recommendation, \
         pricing, reputation, how-to). Do not mention \"{brand}\" in any \
         question.\n\nReturn a JSON array of objects with keys \"text\" and \
         \"intent\"."
    );
    if !context.is_empty() {
        prompt.push_str(&format!("\n\nBrand background for category framing:\n{context}"));
    }
    if !avoid.is_empty() {
        prompt.push_str(&format!(
            "\n\nDo not repeat any of these questions:\n- {}",
            avoid.join("\n- ")
        ));
    }
    prompt
}

/// Parse the model response. JSON is the contract; a numbered or bulleted
/// list is accepted as a fallback since models drift.
fn parse_questions(raw: &str) -> Vec<Question> {
    let body = strip_code_blocks(raw);
    if let Ok(parsed) = serde_json::from_str::<Vec<RawQuestion>>(body) {
        return parsed
            .into_iter()
            .map(|q| Question {
                text: q.text.trim().to_string(),
                intent: if q.intent.trim().is_empty() {
                    "general".to_string()
                } else {
                    q.intent.trim().to_lowercase()
                },
            })
            .collect();
    }

    body.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '-' || c == '*')
                .trim()
        })
        .filter(|line| line.ends_with('?'))
        .map(|line| Question {
            text: line.to_string(),
            intent: "general".to_string(),
        })
        .collect()
}

/// Append candidates to `accepted`, skipping blanks and case-insensitive
/// duplicates, until `limit` questions are held.
fn merge(accepted: &mut Vec<Question>, candidates: Vec<Question>, limit: usize) {
    for candidate in candidates {
        if accepted.len() >= limit {
            break;
        }
        if candidate.text.is_empty() {
            continue;
        }
        let lowered = candidate.text.to_lowercase();
        if accepted.iter().any(|q| q.text.to_lowercase() == lowered) {
            continue;
        }
        accepted.push(candidate);
    }
}

#[async_trait]
impl Stage for QuestionGenStage {
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
        let context = state.brand_context.clone().unwrap_or_default();
        let wanted = config.question_count;

        let mut accepted: Vec<Question> = Vec::with_capacity(wanted);
        let mut last_failure: Option<String> = None;

        let prompt = build_prompt(&state.brand, &context, wanted, &[]);
        let request = GenerationRequest::new(&prompt)
            .system(QUESTION_SYSTEM_PROMPT)
            .temperature(0.8)
            .max_tokens(1024);
        match call_with_retry(policy, "question generation", || deps.generator.generate(&request))
            .await
        {
            Ok(raw) => merge(&mut accepted, parse_questions(&raw), wanted),
            Err(e) => {
                warn!(error = %e, "Question generation call failed");
                last_failure = Some(e.to_string());
            }
        }

        // One corrective pass when the first round came up short.
        if accepted.len() < wanted {
            cancel.check()?;
            let avoid: Vec<String> = accepted.iter().map(|q| q.text.clone()).collect();
            let prompt = build_prompt(&state.brand, &context, wanted - accepted.len(), &avoid);
            let request = GenerationRequest::new(&prompt)
                .system(QUESTION_SYSTEM_PROMPT)
                .temperature(0.9)
                .max_tokens(1024);
            match call_with_retry(policy, "question generation retry", || {
                deps.generator.generate(&request)
            })
            .await
            {
                Ok(raw) => merge(&mut accepted, parse_questions(&raw), wanted),
                Err(e) => {
                    warn!(error = %e, "Question generation retry failed");
                    last_failure = Some(e.to_string());
                }
            }
        }

        if accepted.is_empty() {
            let detail = last_failure.unwrap_or_else(|| "no parseable questions".to_string());
            return Err(PipelineError::Stage {
                stage: STAGE_NAME,
                message: format!("no questions generated: {detail}"),
            });
        }

        if accepted.len() < wanted {
            state.errors.push(StageError::stage(
                STAGE_NAME,
                format!("generated {} of {} questions", accepted.len(), wanted),
            ));
        }

        info!(count = accepted.len(), wanted, "Questions accepted");
        state.questions = accepted;
        Ok(())
    }
}
