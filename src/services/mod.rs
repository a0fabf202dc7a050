pub mod classifier;
pub mod export;
pub mod history;
pub mod providers;
pub mod recommendations;
pub mod reranker;
pub mod scorer;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::{ClassifierPolicy, InterestClassifier};
pub use history::StaticHistory;
pub use recommendations::{Recommender, RecommenderSettings};
pub use reranker::DecayReranker;
pub use scorer::SimilarityScorer;
