//! Name-based adapter selection.
//!
//! New vendors are added by registering a branch here; nothing in the
//! pipeline core changes.

use std::sync::Arc;

use tracing::info;

use geopulse_common::PipelineError;

use crate::claude::ClaudeGenerator;
use crate::openai::OpenAiGenerator;
use crate::serper::SerperSearcher;
use crate::tavily::TavilySearcher;
use crate::traits::{TextGenerator, WebSearcher};

/// Credentials the factory hands to adapters. The caller (CLI, REST layer)
/// loads these; the pipeline core never reads the environment.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub openai: String,
    pub anthropic: String,
    pub tavily: String,
    pub serper: String,
}

fn require(key: &str, name: &str) -> Result<(), PipelineError> {
    if key.is_empty() {
        return Err(PipelineError::InvalidInput(format!(
            "missing API key for provider '{name}'"
        )));
    }
    Ok(())
}

/// Return the text-generation adapter registered under `name`.
pub fn text_generator(
    name: &str,
    keys: &ProviderKeys,
) -> Result<Arc<dyn TextGenerator>, PipelineError> {
    let generator: Arc<dyn TextGenerator> = match name.trim().to_lowercase().as_str() {
        "openai" | "chatgpt" => {
            require(&keys.openai, "openai")?;
            Arc::new(OpenAiGenerator::new(&keys.openai))
        }
        "anthropic" | "claude" => {
            require(&keys.anthropic, "anthropic")?;
            Arc::new(ClaudeGenerator::new(&keys.anthropic))
        }
        other => return Err(PipelineError::UnknownProvider(other.to_string())),
    };
    info!(provider = generator.name(), "Text generator selected");
    Ok(generator)
}

/// Return the web-search adapter registered under `name`.
pub fn web_searcher(
    name: &str,
    keys: &ProviderKeys,
) -> Result<Arc<dyn WebSearcher>, PipelineError> {
    let searcher: Arc<dyn WebSearcher> = match name.trim().to_lowercase().as_str() {
        "tavily" => {
            require(&keys.tavily, "tavily")?;
            Arc::new(TavilySearcher::new(&keys.tavily))
        }
        "serper" | "google" => {
            require(&keys.serper, "serper")?;
            Arc::new(SerperSearcher::new(&keys.serper))
        }
        other => return Err(PipelineError::UnknownProvider(other.to_string())),
    };
    info!(provider = searcher.name(), "Web searcher selected");
    Ok(searcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> ProviderKeys {
        ProviderKeys {
            openai: "sk-test".into(),
            anthropic: "sk-ant-test".into(),
            tavily: "tvly-test".into(),
            serper: "serper-test".into(),
        }
    }

    #[test]
    fn known_generators_resolve() {
        assert!(text_generator("openai", &keys()).is_ok());
        assert!(text_generator("Claude", &keys()).is_ok());
    }

    #[test]
    fn known_searchers_resolve() {
        assert!(web_searcher("tavily", &keys()).is_ok());
        assert!(web_searcher("google", &keys()).is_ok());
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let err = text_generator("mistral", &keys()).err().unwrap();
        assert!(matches!(err, PipelineError::UnknownProvider(_)));
        let err = web_searcher("bing", &keys()).err().unwrap();
        assert!(matches!(err, PipelineError::UnknownProvider(_)));
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = text_generator("openai", &ProviderKeys::default()).err().unwrap();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
