//! Brand mention detection.

use regex::Regex;

use geopulse_common::PipelineError;

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Escape `name` and add `\b` anchors only where the name itself starts
/// or ends with a word character. A `\b` next to punctuation (think
/// "C++") would never match.
fn anchored(name: &str) -> String {
    let escaped = regex::escape(name);
    let lead = if name.chars().next().is_some_and(is_word) {
        r"\b"
    } else {
        ""
    };
    let trail = if name.chars().last().is_some_and(is_word) {
        r"\b"
    } else {
        ""
    };
    format!("{lead}{escaped}{trail}")
}

/// Case-insensitive whole-word matcher over the brand name and its
/// configured aliases. Built once per run, applied to every answer.
pub struct MentionMatcher {
    pattern: Regex,
}

impl MentionMatcher {
    pub fn new(brand: &str, aliases: &[String]) -> Result<Self, PipelineError> {
        let mut names: Vec<String> = Vec::with_capacity(1 + aliases.len());
        names.push(anchored(brand));
        for alias in aliases {
            let alias = alias.trim();
            if !alias.is_empty() {
                names.push(anchored(alias));
            }
        }

        let source = format!(r"(?i)(?:{})", names.join("|"));
        let pattern = Regex::new(&source).map_err(|e| {
            PipelineError::InvalidInput(format!("unusable brand name for matching: {e}"))
        })?;
        Ok(Self { pattern })
    }

    /// Byte offsets of every mention, in document order.
    pub fn offsets(&self, text: &str) -> Vec<usize> {
        self.pattern.find_iter(text).map(|m| m.start()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_are_case_insensitive_and_whole_word() {
        let matcher = MentionMatcher::new("Acme", &[]).unwrap();
        assert_eq!(matcher.offsets("ACME leads. Try acme."), vec![0, 16]);
        // Substrings of longer words do not count.
        assert!(matcher.offsets("Acmeify is unrelated").is_empty());
    }

    #[test]
    fn aliases_count_as_mentions() {
        let matcher =
            MentionMatcher::new("Acme Corp", &["Acme".to_string(), "ACME Inc".to_string()])
                .unwrap();
        let offsets = matcher.offsets("Acme Corp, also sold as acme inc, or just Acme.");
        assert_eq!(offsets.len(), 3);
    }

    #[test]
    fn regex_metacharacters_in_brand_are_literal() {
        let matcher = MentionMatcher::new("C++ Tools (Pro)", &[]).unwrap();
        assert_eq!(matcher.offsets("Use C++ Tools (Pro) daily").len(), 1);
    }
}
