//! Interest classifier.
//!
//! Filters activity titles down to the ones the classification provider
//! scores as entertainment. Titles are deduplicated, split into batches and
//! classified concurrently through a bounded pool; every batch finishes
//! (successfully, with an error, or by timing out) before results are
//! aggregated.

use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{sync::Semaphore, task::JoinSet, time::timeout};

use crate::{
    error::{AppError, AppResult},
    models::Signal,
    services::providers::{ClassificationProvider, LabelScores},
};

pub const DEFAULT_LABELS: [&str; 6] = [
    "Entertainment",
    "Technology",
    "News",
    "Shopping",
    "Education",
    "Health",
];

/// Which label counts as interest, and how confident the provider must be
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierPolicy {
    /// A title is kept when its target-label score is strictly above this
    pub threshold: f32,
    /// Full label set sent with every batch
    pub labels: Vec<String>,
    pub target_label: String,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            target_label: "Entertainment".to_string(),
        }
    }
}

impl ClassifierPolicy {
    /// Pairs each title with its target-label score and keeps the ones above
    /// the threshold. A missing target label scores zero.
    fn keep_relevant(&self, batch: &[String], scores: &[LabelScores]) -> AppResult<Vec<Signal>> {
        if batch.len() != scores.len() {
            return Err(AppError::provider(
                "classification",
                format!(
                    "expected {} results for batch, got {}",
                    batch.len(),
                    scores.len()
                ),
            ));
        }

        Ok(batch
            .iter()
            .zip(scores)
            .filter_map(|(title, label_scores)| {
                let score = label_scores
                    .get(&self.target_label)
                    .copied()
                    .unwrap_or(0.0);
                (score > self.threshold).then(|| Signal::new(title.clone(), score))
            })
            .collect())
    }
}

/// Result of classifying one batch
#[derive(Debug)]
pub enum BatchOutcome {
    Classified(Vec<Signal>),
    Failed(AppError),
    TimedOut,
}

#[derive(Clone)]
pub struct InterestClassifier {
    provider: Arc<dyn ClassificationProvider>,
    policy: Arc<ClassifierPolicy>,
    batch_size: usize,
    worker_pool_size: usize,
    batch_timeout: Duration,
}

impl InterestClassifier {
    pub fn new(provider: Arc<dyn ClassificationProvider>, policy: ClassifierPolicy) -> Self {
        Self {
            provider,
            policy: Arc::new(policy),
            batch_size: 20,
            worker_pool_size: 4,
            batch_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_worker_pool_size(mut self, worker_pool_size: usize) -> Self {
        self.worker_pool_size = worker_pool_size.max(1);
        self
    }

    pub fn with_batch_timeout(mut self, batch_timeout: Duration) -> Self {
        self.batch_timeout = batch_timeout;
        self
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    /// Classifies activity titles into interest signals.
    ///
    /// Failed and timed-out batches are dropped and logged. The call only
    /// fails when every batch failed.
    pub async fn classify<I, S>(&self, titles: I) -> AppResult<Vec<Signal>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let titles = normalize_titles(titles);
        if titles.is_empty() {
            tracing::info!("No valid history titles to classify");
            return Ok(vec![]);
        }

        let start = Instant::now();
        let batches: Vec<Vec<String>> = titles
            .chunks(self.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        let batch_count = batches.len();

        tracing::info!(
            title_count = titles.len(),
            batch_count,
            worker_pool_size = self.worker_pool_size,
            provider = self.provider.name(),
            "Classifying titles"
        );

        let semaphore = Arc::new(Semaphore::new(self.worker_pool_size));
        let mut tasks = JoinSet::new();

        for (index, batch) in batches.into_iter().enumerate() {
            let classifier = self.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => classifier.classify_batch(&batch).await,
                    Err(e) => BatchOutcome::Failed(AppError::Internal(e.to_string())),
                };
                (index, outcome)
            });
        }

        let mut classified: Vec<(usize, Vec<Signal>)> = Vec::with_capacity(batch_count);
        let mut failed = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, BatchOutcome::Classified(kept))) => classified.push((index, kept)),
                Ok((index, BatchOutcome::Failed(e))) => {
                    tracing::warn!(batch = index, error = %e, "Classification batch dropped");
                    failed += 1;
                }
                Ok((index, BatchOutcome::TimedOut)) => {
                    tracing::warn!(
                        batch = index,
                        timeout_ms = self.batch_timeout.as_millis() as u64,
                        "Classification batch timed out"
                    );
                    failed += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Task join error");
                    failed += 1;
                }
            }
        }

        if failed == batch_count {
            return Err(AppError::provider(
                "classification",
                format!("all {} batches failed", batch_count),
            ));
        }

        // Batches finish in any order; keep history order
        classified.sort_by_key(|(index, _)| *index);
        let signals: Vec<Signal> = classified.into_iter().flat_map(|(_, kept)| kept).collect();

        tracing::info!(
            kept = signals.len(),
            dropped_titles = titles.len() - signals.len(),
            failed_batches = failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Classification completed"
        );

        Ok(signals)
    }

    async fn classify_batch(&self, batch: &[String]) -> BatchOutcome {
        let call = self.provider.classify(batch, &self.policy.labels);
        match timeout(self.batch_timeout, call).await {
            Err(_) => BatchOutcome::TimedOut,
            Ok(Err(e)) => BatchOutcome::Failed(e),
            Ok(Ok(scores)) => match self.policy.keep_relevant(batch, &scores) {
                Ok(kept) => BatchOutcome::Classified(kept),
                Err(e) => BatchOutcome::Failed(e),
            },
        }
    }
}

/// Trims titles, drops empty ones and deduplicates, keeping first occurrences
fn normalize_titles<I, S>(titles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .filter_map(|title| {
            let trimmed = title.as_ref().trim();
            (!trimmed.is_empty() && seen.insert(trimmed.to_string())).then(|| trimmed.to_string())
        })
        .collect()
}
