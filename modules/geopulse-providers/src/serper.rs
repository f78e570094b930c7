use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use geopulse_common::{Evidence, ProviderError};

use crate::normalize;
use crate::traits::WebSearcher;

const SERPER_API_URL: &str = "https://google.serper.dev/search";

/// Serper (Google Search) adapter. Approximates what search-backed LLM
/// personas see in the wild.
pub struct SerperSearcher {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

impl SerperSearcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: SERPER_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Evidence>, ProviderError> {
        let body = serde_json::json!({
            "q": query,
            "num": max_results,
        });

        let response = self
            .http
            .post(&self.base_url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| normalize::from_transport("serper", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(normalize::from_status("serper", status, &error_text));
        }

        let data: SerperResponse = response
            .json()
            .await
            .map_err(|e| normalize::from_transport("serper", e))?;

        let results: Vec<Evidence> = data
            .organic
            .into_iter()
            .take(max_results)
            .enumerate()
            .map(|(i, r)| Evidence::new(&r.link, &r.title, &r.snippet, i + 1))
            .collect();

        info!(query, count = results.len(), "Serper search complete");
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "serper"
    }
}
