//! Sentiment classification for simulated answers.
//!
//! The pipeline only needs a coarse three-way label, so the default
//! implementation is a small lexicon counter. Swap in a model-backed
//! classifier through `StageDeps` without touching any stage.

use geopulse_common::Sentiment;

pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Sentiment;
}

const POSITIVE_TERMS: &[&str] = &[
    "excellent",
    "great",
    "best",
    "leading",
    "reliable",
    "trusted",
    "innovative",
    "popular",
    "recommended",
    "strong",
    "top",
    "love",
    "outstanding",
    "impressive",
];

const NEGATIVE_TERMS: &[&str] = &[
    "poor",
    "bad",
    "worst",
    "unreliable",
    "outdated",
    "expensive",
    "complaints",
    "lawsuit",
    "scandal",
    "avoid",
    "scam",
    "criticized",
    "failing",
    "weak",
];

/// Token-counting classifier. Ties and empty texts are neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentiment;

impl SentimentClassifier for LexiconSentiment {
    fn classify(&self, text: &str) -> Sentiment {
        let mut positive = 0usize;
        let mut negative = 0usize;
        for token in text.split_whitespace() {
            let word = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if POSITIVE_TERMS.contains(&word.as_str()) {
                positive += 1;
            } else if NEGATIVE_TERMS.contains(&word.as_str()) {
                negative += 1;
            }
        }
        if positive > negative {
            Sentiment::Positive
        } else if negative > positive {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}
