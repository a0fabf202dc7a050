//! Deterministic in-process providers for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    services::providers::{ClassificationProvider, EmbeddingProvider, LabelScores},
};

/// One dimension per distinct lowercase word seen so far.
///
/// Vectors only extend as far as their highest word index; cosine
/// similarity treats the missing tail as zeros.
#[derive(Default)]
pub struct BagOfWordsEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
}

impl BagOfWordsEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("unembeddable") {
            return Err(AppError::provider("embedding", "input rejected"));
        }

        let mut vocabulary = self
            .vocabulary
            .lock()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let mut vector = Vec::new();
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let next = vocabulary.len();
            let index = *vocabulary.entry(word.to_lowercase()).or_insert(next);
            if vector.len() <= index {
                vector.resize(index + 1, 0.0);
            }
            vector[index] += 1.0;
        }
        Ok(vector)
    }

    fn name(&self) -> &'static str {
        "bag-of-words"
    }
}

/// Scores titles mentioning comedy words as entertainment.
///
/// Batches containing "poison" fail, batches containing "slow" stall.
pub struct KeywordClassifier;

pub fn keyword_scores(title: &str) -> LabelScores {
    let lower = title.to_lowercase();
    let entertainment = if lower.contains("funny") || lower.contains("comedy") {
        0.82
    } else if lower.contains("trailer") {
        0.3
    } else {
        0.05
    };
    HashMap::from([
        ("Entertainment".to_string(), entertainment),
        ("News".to_string(), 1.0 - entertainment),
    ])
}

#[async_trait::async_trait]
impl ClassificationProvider for KeywordClassifier {
    async fn classify(&self, batch: &[String], _labels: &[String]) -> AppResult<Vec<LabelScores>> {
        if batch.iter().any(|t| t.contains("poison")) {
            return Err(AppError::provider("classification", "model crashed"));
        }
        if batch.iter().any(|t| t.contains("slow")) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        Ok(batch.iter().map(|t| keyword_scores(t)).collect())
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
