use serde::Deserialize;
use std::time::Duration;

use crate::services::classifier::ClassifierPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// TMDb API key
    pub tmdb_api_key: String,

    /// TMDb API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Text embeddings inference server
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,

    /// Zero-shot classification endpoint
    #[serde(default = "default_classifier_url")]
    pub classifier_url: String,

    /// Bearer token sent to both inference endpoints
    #[serde(default)]
    pub inference_token: Option<String>,

    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    #[serde(default = "default_classification_batch_size")]
    pub classification_batch_size: usize,

    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    /// Upper bound on a single provider call, in seconds
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// Contributions kept per candidate
    #[serde(default = "default_top_contributions")]
    pub top_contributions: usize,

    #[serde(default = "default_decay_factor")]
    pub decay_factor: f32,

    /// Recommendations returned to the caller
    #[serde(default = "default_result_count")]
    pub result_count: usize,

    /// Scored candidates handed to the reranker
    #[serde(default = "default_shortlist_size")]
    pub shortlist_size: usize,

    /// Movies fetched from the catalog per request
    #[serde(default = "default_candidate_count")]
    pub candidate_count: usize,

    /// History records read per request
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_embedding_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_classifier_url() -> String {
    "https://api-inference.huggingface.co/models/roberta-large-mnli".to_string()
}

fn default_relevance_threshold() -> f32 {
    0.25
}

fn default_classification_batch_size() -> usize {
    20
}

fn default_worker_pool_size() -> usize {
    4
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_top_contributions() -> usize {
    5
}

fn default_decay_factor() -> f32 {
    0.8
}

fn default_result_count() -> usize {
    5
}

fn default_shortlist_size() -> usize {
    5
}

fn default_candidate_count() -> usize {
    500
}

fn default_history_limit() -> usize {
    1000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the recommendation pipeline cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            anyhow::bail!(
                "relevance_threshold must be within [0, 1], got {}",
                self.relevance_threshold
            );
        }
        if self.decay_factor <= 0.0 || self.decay_factor > 1.0 {
            anyhow::bail!(
                "decay_factor must be within (0, 1], got {}",
                self.decay_factor
            );
        }
        if self.classification_batch_size == 0 {
            anyhow::bail!("classification_batch_size must be positive");
        }
        if self.worker_pool_size == 0 {
            anyhow::bail!("worker_pool_size must be positive");
        }
        if self.top_contributions == 0 {
            anyhow::bail!("top_contributions must be positive");
        }
        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn classifier_policy(&self) -> ClassifierPolicy {
        ClassifierPolicy {
            threshold: self.relevance_threshold,
            ..ClassifierPolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        serde_json::from_value(serde_json::json!({ "tmdb_api_key": "test_key" })).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = test_config();
        assert_eq!(config.relevance_threshold, 0.25);
        assert_eq!(config.classification_batch_size, 20);
        assert_eq!(config.worker_pool_size, 4);
        assert_eq!(config.top_contributions, 5);
        assert_eq!(config.decay_factor, 0.8);
        assert_eq!(config.result_count, 5);
        assert_eq!(config.shortlist_size, 5);
        assert_eq!(config.inference_token, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let mut config = test_config();
        config.classification_batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_decay_out_of_range() {
        let mut config = test_config();
        config.decay_factor = 1.5;
        assert!(config.validate().is_err());
        config.decay_factor = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_classifier_policy_uses_threshold() {
        let mut config = test_config();
        config.relevance_threshold = 0.4;
        let policy = config.classifier_policy();
        assert_eq!(policy.threshold, 0.4);
        assert_eq!(policy.target_label, "Entertainment");
        assert_eq!(policy.labels.len(), 6);
    }
}
