use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use geopulse_common::{Evidence, ProviderError};

use crate::normalize;
use crate::traits::WebSearcher;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

/// Tavily web search adapter. Tavily returns LLM-oriented structured
/// results; its `content` field maps to the evidence snippet.
pub struct TavilySearcher {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct TavilyRequest {
    api_key: String,
    query: String,
    max_results: usize,
    search_depth: String,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl TavilySearcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: TAVILY_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Evidence>, ProviderError> {
        let request = TavilyRequest {
            api_key: self.api_key.clone(),
            query: query.to_string(),
            max_results,
            search_depth: "basic".to_string(),
        };

        let response = self
            .http
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| normalize::from_transport("tavily", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(normalize::from_status("tavily", status, &error_text));
        }

        let data: TavilyResponse = response
            .json()
            .await
            .map_err(|e| normalize::from_transport("tavily", e))?;

        let results: Vec<Evidence> = data
            .results
            .into_iter()
            .take(max_results)
            .enumerate()
            .map(|(i, r)| Evidence::new(&r.url, &r.title, &r.content, i + 1))
            .collect();

        info!(query, count = results.len(), "Tavily search complete");
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}
