/// Zero-shot classification over the Hugging Face inference API
///
/// Sends a whole batch in one request with the candidate labels as
/// parameters. The endpoint answers with one `{sequence, labels, scores}`
/// object per input, in input order.
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::providers::{ClassificationProvider, LabelScores},
};

const PROVIDER: &str = "classification";

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a [String],
    parameters: ZeroShotParameters<'a>,
}

#[derive(Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

#[derive(Debug, Deserialize)]
struct ZeroShotResult {
    labels: Vec<String>,
    scores: Vec<f32>,
}

#[derive(Clone)]
pub struct ZeroShotClassifier {
    http_client: HttpClient,
    api_url: String,
    token: Option<String>,
}

impl ZeroShotClassifier {
    pub fn new(api_url: String, token: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            token,
        }
    }
}

#[async_trait::async_trait]
impl ClassificationProvider for ZeroShotClassifier {
    async fn classify(&self, batch: &[String], labels: &[String]) -> AppResult<Vec<LabelScores>> {
        let mut request = self.http_client.post(&self.api_url).json(&ZeroShotRequest {
            inputs: batch,
            parameters: ZeroShotParameters {
                candidate_labels: labels,
                multi_label: false,
            },
        });
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
                format!("zero-shot endpoint returned status {}: {}", status, body),
            ));
        }

        let results: Vec<ZeroShotResult> = response.json().await.map_err(|e| {
            AppError::provider(PROVIDER, format!("invalid zero-shot response: {}", e))
        })?;

        Ok(results
            .into_iter()
            .map(|result| result.labels.into_iter().zip(result.scores).collect())
            .collect())
    }

    fn name(&self) -> &'static str {
        "zero-shot"
    }
}
