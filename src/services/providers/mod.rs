//! External capabilities the recommender depends on
//!
//! Each capability is a trait so the pipeline can be wired with HTTP-backed
//! implementations in production and with fakes in tests. Providers are
//! passed around as `Arc<dyn Trait>` and never held as globals.

use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{CandidateItem, HistoryRecord},
};

pub mod tei;
pub mod tmdb;
pub mod zero_shot;

pub use tei::TeiEmbedder;
pub use tmdb::TmdbCatalog;
pub use zero_shot::ZeroShotClassifier;

/// Label scores for one input text
pub type LabelScores = HashMap<String, f32>;

/// Maps text to a fixed-dimension vector
///
/// Implementations must be deterministic: identical input yields an
/// identical vector.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Zero-shot text classification
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ClassificationProvider: Send + Sync {
    /// Scores every text in `batch` against `labels`.
    ///
    /// The result is aligned positionally with `batch`.
    async fn classify(&self, batch: &[String], labels: &[String]) -> AppResult<Vec<LabelScores>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Remote movie catalog
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetches up to `count` movies in catalog order
    async fn fetch_candidates(&self, count: usize) -> AppResult<Vec<CandidateItem>>;

    fn name(&self) -> &'static str;
}

/// Read-only browsing history
#[async_trait::async_trait]
pub trait HistorySource: Send + Sync {
    /// Returns at most `limit` visits, most recent first
    async fn recent(&self, limit: usize) -> AppResult<Vec<HistoryRecord>>;
}
