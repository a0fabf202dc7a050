/// Text Embeddings Inference provider
///
/// Talks to a TEI server (`POST /embed`) hosting a sentence embedding model
/// such as `all-MiniLM-L6-v2`.
use reqwest::Client as HttpClient;
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    services::providers::EmbeddingProvider,
};

const PROVIDER: &str = "embedding";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
}

#[derive(Clone)]
pub struct TeiEmbedder {
    http_client: HttpClient,
    api_url: String,
    token: Option<String>,
}

impl TeiEmbedder {
    pub fn new(api_url: String, token: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TeiEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/embed", self.api_url);

        let mut request = self
            .http_client
            .post(&url)
            .json(&EmbedRequest { inputs: text });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::provider(PROVIDER, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::provider(
                PROVIDER,
                format!("TEI returned status {}: {}", status, body),
            ));
        }

        let mut vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| AppError::provider(PROVIDER, format!("invalid TEI response: {}", e)))?;

        if vectors.is_empty() {
            return Err(AppError::provider(PROVIDER, "TEI returned no vectors"));
        }

        Ok(vectors.swap_remove(0))
    }

    fn name(&self) -> &'static str {
        "tei"
    }
}
