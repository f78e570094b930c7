use std::env;
use std::time::Duration;

/// Tunables for one audit run. Owned by the caller, consumed by the core.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// How many questions to generate (N).
    pub question_count: usize,
    /// Evidence cap per question (K).
    pub max_search_results: usize,
    /// Retry attempts per provider call, on top of the first try.
    pub max_retries: u32,
    /// Base backoff duration; actual delay is base * 2^attempt + jitter.
    pub backoff_base: Duration,
    /// Deadline for a single provider call.
    pub call_timeout: Duration,
    /// Concurrent per-question provider calls within a stage.
    pub concurrency: usize,
    /// Brand context is truncated beyond this many bytes (char-boundary safe).
    pub context_max_chars: usize,
    /// Sub-score bonus when the earliest mention falls in the first third
    /// of the answer. Capped so a sub-score never exceeds 1.0.
    pub position_bonus: f64,
    /// Sub-score penalty for negative sentiment. Floored at 0.0.
    pub sentiment_penalty: f64,
    /// Alternate names that count as brand mentions.
    pub brand_aliases: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            question_count: 5,
            max_search_results: 5,
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
            call_timeout: Duration::from_secs(30),
            concurrency: 4,
            context_max_chars: 1200,
            position_bonus: 0.2,
            sentiment_penalty: 0.3,
            brand_aliases: Vec::new(),
        }
    }
}

/// Process-level configuration loaded from environment variables.
/// Only the CLI reads this; the core never touches the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub anthropic_api_key: String,
    pub tavily_api_key: String,
    pub serper_api_key: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Keys are optional here; the factory fails with a clear error when an
    /// adapter is requested whose key is missing.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            tavily_api_key: optional_env("TAVILY_API_KEY"),
            serper_api_key: optional_env("SERPER_API_KEY"),
        }
    }

    /// Log which keys are present without revealing them.
    pub fn log_redacted(&self) {
        tracing::info!(
            openai = !self.openai_api_key.is_empty(),
            anthropic = !self.anthropic_api_key.is_empty(),
            tavily = !self.tavily_api_key.is_empty(),
            serper = !self.serper_api_key.is_empty(),
            "Provider credentials loaded"
        );
    }
}

fn optional_env(key: &str) -> String {
    env::var(key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AuditConfig::default();
        assert_eq!(cfg.question_count, 5);
        assert_eq!(cfg.max_search_results, 5);
        assert!(cfg.position_bonus > 0.0 && cfg.position_bonus < 1.0);
        assert!(cfg.sentiment_penalty > 0.0 && cfg.sentiment_penalty <= 1.0);
        assert!(cfg.concurrency >= 1);
    }
}
