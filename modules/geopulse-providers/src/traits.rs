use async_trait::async_trait;

use geopulse_common::{Evidence, ProviderError};

/// One text-generation request. Stages build these; adapters translate them
/// into vendor wire formats.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System/preamble prompt, when the vendor supports one.
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// "Generate text" capability. One adapter per LLM vendor.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;

    /// Adapter name, for logging.
    fn name(&self) -> &'static str;
}

/// "Perform web search" capability. One adapter per search vendor.
/// Results come back in vendor rank order; the caller assigns relevance
/// ranks from that order.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Evidence>, ProviderError>;

    fn name(&self) -> &'static str;
}
