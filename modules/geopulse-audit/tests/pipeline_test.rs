//! Full-pipeline tests against in-memory provider stubs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use geopulse_audit::{run_audit, CancelToken, LexiconSentiment, StageDeps};
use geopulse_common::{
    AuditConfig, Evidence, PipelineError, ProviderError, ProviderErrorKind, TargetProvider,
};
use geopulse_providers::{GenerationRequest, TextGenerator, WebSearcher};

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

/// Scripted generator. Question-generation prompts get `questions_json`,
/// context prompts get `context`, simulation prompts get the answer keyed
/// by whichever question text appears in the prompt.
struct StubGenerator {
    questions_json: String,
    context: String,
    answers: HashMap<String, String>,
    /// Simulation prompts containing this substring fail non-retryably.
    fail_on: Option<String>,
}

impl StubGenerator {
    fn new(questions_json: &str, answers: &[(&str, &str)]) -> Self {
        Self {
            questions_json: questions_json.to_string(),
            context: "Acme makes athletic footwear sold worldwide.".to_string(),
            answers: answers
                .iter()
                .map(|(q, a)| (q.to_string(), a.to_string()))
                .collect(),
            fail_on: None,
        }
    }

    fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let prompt = &request.prompt;
        if prompt.contains("Return a JSON array") {
            return Ok(self.questions_json.clone());
        }
        if prompt.contains("factual profile") {
            return Ok(self.context.clone());
        }
        if let Some(needle) = &self.fail_on {
            if prompt.contains(needle.as_str()) {
                return Err(ProviderError::new(
                    ProviderErrorKind::Api,
                    "scripted failure",
                    false,
                ));
            }
        }
        for (question, answer) in &self.answers {
            if prompt.contains(question.as_str()) {
                return Ok(answer.clone());
            }
        }
        Ok("I do not have enough information to answer that.".to_string())
    }

    fn name(&self) -> &'static str {
        "stub-generator"
    }
}

struct StubSearcher {
    fail: bool,
}

#[async_trait]
impl WebSearcher for StubSearcher {
    async fn search(&self, query: &str, _max: usize) -> Result<Vec<Evidence>, ProviderError> {
        if self.fail {
            return Err(ProviderError::new(
                ProviderErrorKind::Api,
                "search backend down",
                false,
            ));
        }
        Ok(vec![Evidence::new(
            &format!("https://example.com/{}", query.len()),
            "Running shoe roundup",
            "A comparison of current running shoes.",
            1,
        )])
    }

    fn name(&self) -> &'static str {
        "stub-searcher"
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const Q1: &str = "What are the best running shoes for beginners?";
const Q2: &str = "How much should I spend on running shoes?";
const Q3: &str = "Which running shoe brands are most durable?";

fn three_questions_json() -> String {
    format!(
        r#"[{{"text": "{Q1}", "intent": "comparison"}},
            {{"text": "{Q2}", "intent": "pricing"}},
            {{"text": "{Q3}", "intent": "reputation"}}]"#
    )
}

/// Two of three answers mention the brand early with neutral wording.
fn two_of_three_answers() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            Q1,
            "Acme is one option many runners start with. Their entry models \
             come in standard widths and the sizing runs true for most people.",
        ),
        (
            Q2,
            "Acme pricing sits in the middle of the market. You can spend less \
             on older models or more on carbon-plated racing shoes from any vendor.",
        ),
        (
            Q3,
            "Durability varies more by model than by company. Rotating two \
             pairs and replacing them near 500 miles matters more than the label.",
        ),
    ]
}

fn test_config() -> AuditConfig {
    AuditConfig {
        question_count: 3,
        max_retries: 0,
        backoff_base: Duration::from_millis(1),
        call_timeout: Duration::from_secs(5),
        concurrency: 2,
        ..AuditConfig::default()
    }
}

fn deps(generator: StubGenerator, searcher: StubSearcher) -> StageDeps {
    StageDeps {
        generator: Arc::new(generator),
        searcher: Arc::new(searcher),
        sentiment: Arc::new(LexiconSentiment),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_of_three_mentions_score_two_thirds() {
    let deps = deps(
        StubGenerator::new(&three_questions_json(), &two_of_three_answers()),
        StubSearcher { fail: false },
    );
    let report = run_audit(
        "Acme",
        TargetProvider::ChatGpt,
        &test_config(),
        &deps,
        &CancelToken::new(),
    )
    .await
    .unwrap();

    // Two early neutral mentions cap at 1.0 each; one answer without a
    // mention scores 0.0. Mean over three answered questions.
    assert!((report.score - 2.0 / 3.0).abs() < 1e-9);
    assert!((0.0..=1.0).contains(&report.score));
    assert_eq!(report.questions.len(), 3);
    assert!(report.questions.iter().all(|q| q.answered));
    assert_eq!(report.questions[0].mention_count, 1);
    assert_eq!(report.questions[2].mention_count, 0);
}

#[tokio::test]
async fn identical_inputs_produce_identical_reports() {
    let config = test_config();
    let mut runs = Vec::new();
    for _ in 0..2 {
        let deps = deps(
            StubGenerator::new(&three_questions_json(), &two_of_three_answers()),
            StubSearcher { fail: false },
        );
        let report = run_audit(
            "Acme",
            TargetProvider::ChatGpt,
            &config,
            &deps,
            &CancelToken::new(),
        )
        .await
        .unwrap();
        let breakdown = serde_json::to_string(&report.questions).unwrap();
        runs.push((report.score, report.recommendations, breakdown));
    }
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn failed_simulation_is_excluded_from_the_average() {
    let generator =
        StubGenerator::new(&three_questions_json(), &two_of_three_answers()).failing_on(Q3);
    let deps = deps(generator, StubSearcher { fail: false });
    let report = run_audit(
        "Acme",
        TargetProvider::ChatGpt,
        &test_config(),
        &deps,
        &CancelToken::new(),
    )
    .await
    .unwrap();

    // The two surviving answers both mention the brand early, so the mean
    // over the two-question denominator is exactly 1.0.
    assert!((report.score - 1.0).abs() < 1e-9);
    assert!(!report.questions[2].answered);
    assert!(report.questions[2].sub_score.is_none());
    assert!(report
        .warnings
        .iter()
        .any(|w| w.stage == "simulation" && w.question == Some(2)));
}

#[tokio::test]
async fn search_outage_completes_with_warnings() {
    let deps = deps(
        StubGenerator::new(&three_questions_json(), &two_of_three_answers()),
        StubSearcher { fail: true },
    );
    let report = run_audit(
        "Acme",
        TargetProvider::Claude,
        &test_config(),
        &deps,
        &CancelToken::new(),
    )
    .await
    .unwrap();

    assert!(report.questions.iter().all(|q| q.evidence_count == 0));
    assert_eq!(
        report
            .warnings
            .iter()
            .filter(|w| w.stage == "search")
            .count(),
        3
    );
    // Simulation still ran without evidence.
    assert!(report.questions.iter().all(|q| q.answered));
}

#[tokio::test]
async fn zero_questions_is_fatal() {
    let deps = deps(
        StubGenerator::new("[]", &[]),
        StubSearcher { fail: false },
    );
    let err = run_audit(
        "Acme",
        TargetProvider::ChatGpt,
        &test_config(),
        &deps,
        &CancelToken::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.stage_name(), Some("question_generation"));
}

#[tokio::test]
async fn duplicate_questions_are_collapsed() {
    let json = format!(
        r#"[{{"text": "{Q1}", "intent": "comparison"}},
            {{"text": "{}", "intent": "comparison"}},
            {{"text": "{Q2}", "intent": "pricing"}}]"#,
        Q1.to_uppercase()
    );
    let deps = deps(
        StubGenerator::new(&json, &two_of_three_answers()),
        StubSearcher { fail: false },
    );
    let report = run_audit(
        "Acme",
        TargetProvider::ChatGpt,
        &test_config(),
        &deps,
        &CancelToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.questions.len(), 2);
    let mut texts: Vec<String> = report
        .questions
        .iter()
        .map(|q| q.text.to_lowercase())
        .collect();
    texts.dedup();
    assert_eq!(texts.len(), 2);
    // The shortfall is reported, not fatal.
    assert!(report
        .warnings
        .iter()
        .any(|w| w.stage == "question_generation"));
}

#[tokio::test]
async fn cancelled_token_aborts_the_run() {
    let deps = deps(
        StubGenerator::new(&three_questions_json(), &two_of_three_answers()),
        StubSearcher { fail: false },
    );
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = run_audit(
        "Acme",
        TargetProvider::ChatGpt,
        &test_config(),
        &deps,
        &cancel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled));
}

#[tokio::test]
async fn blank_brand_is_rejected_before_any_provider_call() {
    let deps = deps(
        StubGenerator::new(&three_questions_json(), &[]),
        StubSearcher { fail: false },
    );
    let err = run_audit(
        "  ",
        TargetProvider::ChatGpt,
        &test_config(),
        &deps,
        &CancelToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));
}
