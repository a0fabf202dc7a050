//! Similarity scoring.
//!
//! Each candidate is compared against every signal by cosine similarity of
//! their embeddings. The candidate's score blends its single best match with
//! the mean of its five best matches:
//!
//! `combined = (best + mean(top5)) / 2`
//!
//! Only the top matches are carried forward as contributions.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::time::timeout;

use crate::{
    error::{AppError, AppResult},
    models::{CandidateItem, Contribution, ScoredCandidate, Signal},
    services::providers::EmbeddingProvider,
};

/// Cosine of the angle between two vectors.
///
/// A zero-norm vector has no direction; its similarity to anything is 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Blends a candidate's similarities into `(combined_score, top_k)`.
///
/// Returns `None` when there is nothing to blend.
pub fn blend_similarities(
    mut similarities: Vec<Contribution>,
    top_k: usize,
) -> Option<(f32, Vec<Contribution>)> {
    if similarities.is_empty() || top_k == 0 {
        return None;
    }

    similarities.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    similarities.truncate(top_k);

    let best = similarities[0].similarity;
    let avg_top = similarities.iter().map(|c| c.similarity).sum::<f32>() / similarities.len() as f32;

    Some(((best + avg_top) / 2.0, similarities))
}

/// Per-request signal embeddings, computed once per unique text
#[derive(Default)]
struct SignalEmbeddings {
    /// Insertion order, so contributions are built deterministically
    entries: Vec<(String, Vec<f32>)>,
    index: HashMap<String, usize>,
}

impl SignalEmbeddings {
    fn contains(&self, text: &str) -> bool {
        self.index.contains_key(text)
    }

    fn insert(&mut self, text: String, embedding: Vec<f32>) {
        self.index.insert(text.clone(), self.entries.len());
        self.entries.push((text, embedding));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn similarities(&self, embedding: &[f32]) -> Vec<Contribution> {
        self.entries
            .iter()
            .map(|(text, signal_embedding)| {
                Contribution::new(text.clone(), cosine_similarity(embedding, signal_embedding))
            })
            .collect()
    }
}

pub struct SimilarityScorer {
    provider: Arc<dyn EmbeddingProvider>,
    top_contributions: usize,
    embed_timeout: Duration,
}

impl SimilarityScorer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            top_contributions: 5,
            embed_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_top_contributions(mut self, top_contributions: usize) -> Self {
        self.top_contributions = top_contributions.max(1);
        self
    }

    pub fn with_embed_timeout(mut self, embed_timeout: Duration) -> Self {
        self.embed_timeout = embed_timeout;
        self
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        match timeout(self.embed_timeout, self.provider.embed(text)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} embedding",
                self.provider.name()
            ))),
        }
    }

    /// Embeds every distinct signal text once. Signals that cannot be
    /// embedded are dropped.
    async fn embed_signals(&self, signals: &[Signal]) -> AppResult<SignalEmbeddings> {
        let mut cache = SignalEmbeddings::default();
        let mut failed = 0usize;

        for signal in signals {
            if cache.contains(&signal.text) {
                continue;
            }
            match self.embed(&signal.text).await {
                Ok(embedding) => cache.insert(signal.text.clone(), embedding),
                Err(e) => {
                    tracing::warn!(signal = %signal.text, error = %e, "Signal embedding dropped");
                    failed += 1;
                }
            }
        }

        if cache.is_empty() && failed > 0 {
            return Err(AppError::provider(
                "embedding",
                format!("none of {} signals could be embedded", failed),
            ));
        }

        Ok(cache)
    }

    /// Scores candidates against signals, highest combined score first.
    ///
    /// Candidates whose embedding fails are dropped. Ties keep the input
    /// order.
    pub async fn score(
        &self,
        signals: &[Signal],
        candidates: &[CandidateItem],
    ) -> AppResult<Vec<ScoredCandidate>> {
        if signals.is_empty() || candidates.is_empty() {
            tracing::info!(
                signal_count = signals.len(),
                candidate_count = candidates.len(),
                "Nothing to score"
            );
            return Ok(vec![]);
        }

        let start = Instant::now();
        let signal_embeddings = self.embed_signals(signals).await?;

        let mut scored = Vec::with_capacity(candidates.len());
        let mut failed = 0usize;

        for candidate in candidates {
            let embedding = match self.embed(&candidate.descriptive_text()).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    tracing::warn!(movie_id = candidate.id, error = %e, "Candidate embedding dropped");
                    failed += 1;
                    continue;
                }
            };

            let similarities = signal_embeddings.similarities(&embedding);
            let Some((combined_score, contributions)) =
                blend_similarities(similarities, self.top_contributions)
            else {
                continue;
            };

            match ScoredCandidate::new(candidate.clone(), combined_score, contributions) {
                Some(scored_candidate) => scored.push(scored_candidate),
                None => {
                    tracing::debug!(movie_id = candidate.id, "Degenerate score, candidate excluded")
                }
            }
        }

        if scored.is_empty() && failed == candidates.len() {
            return Err(AppError::provider(
                "embedding",
                format!("none of {} candidates could be embedded", failed),
            ));
        }

        scored.sort_by(|a, b| b.combined_score().total_cmp(&a.combined_score()));

        tracing::info!(
            signal_count = signal_embeddings.len(),
            scored = scored.len(),
            failed_candidates = failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Candidates scored"
        );

        Ok(scored)
    }
}
