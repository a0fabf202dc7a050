use std::{sync::Arc, time::Instant};

use crate::{
    config::Config,
    error::AppResult,
    models::{Recommendation, Signal},
    services::{
        classifier::InterestClassifier,
        history::activity_titles,
        providers::{CatalogProvider, ClassificationProvider, EmbeddingProvider, HistorySource},
        reranker::DecayReranker,
        scorer::SimilarityScorer,
    },
};

/// Request-independent sizes of each pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderSettings {
    pub history_limit: usize,
    pub candidate_count: usize,
    /// Scored candidates handed to the reranker
    pub shortlist_size: usize,
    pub result_count: usize,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            history_limit: 1000,
            candidate_count: 500,
            shortlist_size: 5,
            result_count: 5,
        }
    }
}

impl From<&Config> for RecommenderSettings {
    fn from(config: &Config) -> Self {
        Self {
            history_limit: config.history_limit,
            candidate_count: config.candidate_count,
            shortlist_size: config.shortlist_size,
            result_count: config.result_count,
        }
    }
}

/// Generates movie recommendations from browsing history
///
/// history → activity titles → interest signals → scored candidates →
/// shortlist → decay rerank → top results
pub struct Recommender {
    classifier: InterestClassifier,
    scorer: SimilarityScorer,
    reranker: DecayReranker,
    catalog: Arc<dyn CatalogProvider>,
    settings: RecommenderSettings,
}

impl Recommender {
    pub fn new(
        classifier: InterestClassifier,
        scorer: SimilarityScorer,
        reranker: DecayReranker,
        catalog: Arc<dyn CatalogProvider>,
        settings: RecommenderSettings,
    ) -> Self {
        Self {
            classifier,
            scorer,
            reranker,
            catalog,
            settings,
        }
    }

    /// Wires every stage from configuration
    pub fn from_config(
        config: &Config,
        classification: Arc<dyn ClassificationProvider>,
        embedding: Arc<dyn EmbeddingProvider>,
        catalog: Arc<dyn CatalogProvider>,
    ) -> Self {
        let classifier = InterestClassifier::new(classification, config.classifier_policy())
            .with_batch_size(config.classification_batch_size)
            .with_worker_pool_size(config.worker_pool_size)
            .with_batch_timeout(config.provider_timeout());
        let scorer = SimilarityScorer::new(embedding)
            .with_top_contributions(config.top_contributions)
            .with_embed_timeout(config.provider_timeout());
        let reranker = DecayReranker::new(config.decay_factor);

        Self::new(
            classifier,
            scorer,
            reranker,
            catalog,
            RecommenderSettings::from(config),
        )
    }

    /// Interest signals found in the history, strongest first
    pub async fn signals(&self, history: &dyn HistorySource) -> AppResult<Vec<Signal>> {
        let records = history.recent(self.settings.history_limit).await?;
        let titles = activity_titles(&records);

        let mut signals = self.classifier.classify(&titles).await?;
        signals.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        Ok(signals)
    }

    pub async fn recommend(&self, history: &dyn HistorySource) -> AppResult<Vec<Recommendation>> {
        let start = Instant::now();

        let signals = self.signals(history).await?;
        if signals.is_empty() {
            tracing::info!("No interest signals found, returning no recommendations");
            return Ok(vec![]);
        }

        let candidates = self
            .catalog
            .fetch_candidates(self.settings.candidate_count)
            .await?;
        if candidates.is_empty() {
            tracing::info!(
                catalog = self.catalog.name(),
                "Catalog returned no candidates"
            );
            return Ok(vec![]);
        }

        let mut scored = self.scorer.score(&signals, &candidates).await?;
        scored.truncate(self.settings.shortlist_size);

        let mut recommendations = self.reranker.rerank(scored);
        recommendations.truncate(self.settings.result_count);

        tracing::info!(
            signals = signals.len(),
            candidates = candidates.len(),
            recommendations = recommendations.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommendations generated"
        );

        Ok(recommendations)
    }
}
