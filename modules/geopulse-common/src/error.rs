use serde::Serialize;
use thiserror::Error;

/// Broad classification of a vendor call failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// The call exceeded its configured deadline.
    Timeout,
    /// The vendor returned HTTP 429.
    RateLimited,
    /// The vendor returned an error response (non-429 HTTP error).
    Api,
    /// The response body could not be decoded.
    Malformed,
    /// Connection-level failure before a response arrived.
    Network,
}

/// Normalized provider failure. Adapters fold every vendor-specific error
/// into this before returning; callers never see reqwest or wire types.
#[derive(Debug, Clone, Error)]
#[error("{kind:?} provider error: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message, false)
    }
}

/// A recoverable failure scoped to one stage (and optionally one question).
/// Recorded in the audit state and surfaced as a warning; never aborts the run.
#[derive(Debug, Clone, Serialize)]
pub struct StageError {
    pub stage: &'static str,
    /// Question index the error is tied to; `None` for whole-stage errors.
    pub question: Option<usize>,
    pub message: String,
    pub recoverable: bool,
}

impl StageError {
    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            question: None,
            message: message.into(),
            recoverable: true,
        }
    }

    pub fn question(stage: &'static str, question: usize, message: impl Into<String>) -> Self {
        Self {
            stage,
            question: Some(question),
            message: message.into(),
            recoverable: true,
        }
    }
}

/// Fatal pipeline failure. The run aborts and no partial score is returned.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("stage {stage} failed: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },

    #[error("audit cancelled")]
    Cancelled,

    #[error("invalid audit input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    /// Stage name for diagnostics, when the failure is tied to one.
    pub fn stage_name(&self) -> Option<&'static str> {
        match self {
            PipelineError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}
