use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// The LLM persona whose answers the audit simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetProvider {
    ChatGpt,
    Gemini,
    Claude,
    Perplexity,
}

impl TargetProvider {
    /// Label embedded in the simulation prompt ("answer as X would").
    pub fn persona(&self) -> &'static str {
        match self {
            TargetProvider::ChatGpt => "ChatGPT",
            TargetProvider::Gemini => "Gemini",
            TargetProvider::Claude => "Claude",
            TargetProvider::Perplexity => "Perplexity",
        }
    }

    /// The search backend that best approximates what this provider sees.
    /// Providers without their own web search fall back to Tavily.
    pub fn default_search_provider(&self) -> &'static str {
        match self {
            TargetProvider::ChatGpt => "serper",
            TargetProvider::Gemini => "serper",
            TargetProvider::Claude => "tavily",
            TargetProvider::Perplexity => "tavily",
        }
    }
}

impl FromStr for TargetProvider {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chatgpt" | "gpt-4" | "gpt-4o" | "openai" => Ok(TargetProvider::ChatGpt),
            "gemini" | "google" => Ok(TargetProvider::Gemini),
            "claude" | "anthropic" => Ok(TargetProvider::Claude),
            "perplexity" => Ok(TargetProvider::Perplexity),
            other => Err(PipelineError::UnknownProvider(other.to_string())),
        }
    }
}

impl fmt::Display for TargetProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.persona())
    }
}

/// A user question generated for the audit. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    /// Intent category, e.g. "comparison", "pricing", "reputation".
    pub intent: String,
}

/// One ranked web search result backing a question's simulated answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub url: String,
    pub domain: String,
    pub title: String,
    pub snippet: String,
    /// 1-based relevance rank, unique within one question's result set.
    pub rank: usize,
}

impl Evidence {
    pub fn new(url: &str, title: &str, snippet: &str, rank: usize) -> Self {
        let domain = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            url: url.to_string(),
            domain,
            title: title.to_string(),
            snippet: snippet.to_string(),
            rank,
        }
    }
}

/// Sentiment label assigned to a simulated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// The answer the target LLM would give for one question, plus the brand
/// signals extracted from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedAnswer {
    /// Index of the question this answers (the join key across stages).
    pub question: usize,
    pub text: String,
    pub mention_count: usize,
    /// Byte offsets of each brand/alias mention, in document order.
    pub mention_offsets: Vec<usize>,
    pub sentiment: Sentiment,
}

impl SimulatedAnswer {
    /// The defaulted answer recorded when simulation fails entirely.
    pub fn failed(question: usize) -> Self {
        Self {
            question,
            text: String::new(),
            mention_count: 0,
            mention_offsets: Vec::new(),
            sentiment: Sentiment::Neutral,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
