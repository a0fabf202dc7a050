use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod tmdb;

pub use tmdb::{TmdbDiscoverPage, TmdbMovieDetails};

/// One visit from the browser history, most recent first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub visit_count: u32,
    pub visit_time: DateTime<Utc>,
}

/// A browsing title judged relevant to the user's entertainment interests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub text: String,
    pub relevance_score: f32,
}

impl Signal {
    pub fn new(text: impl Into<String>, relevance_score: f32) -> Self {
        Self {
            text: text.into(),
            relevance_score,
        }
    }
}

/// A movie eligible for recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateItem {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
}

impl CandidateItem {
    /// Text submitted to the embedding provider: title, tagline, overview,
    /// genre names and keyword names
    pub fn descriptive_text(&self) -> String {
        [
            self.title.as_str(),
            self.tagline.as_str(),
            self.overview.as_str(),
            self.genres.join(" ").as_str(),
            self.keywords.join(" ").as_str(),
        ]
        .join(" ")
    }
}

/// Similarity between a candidate and one signal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contribution {
    pub signal_text: String,
    pub similarity: f32,
}

impl Contribution {
    pub fn new(signal_text: impl Into<String>, similarity: f32) -> Self {
        Self {
            signal_text: signal_text.into(),
            similarity,
        }
    }
}

/// A candidate with its blended score and the signals that produced it.
///
/// Only the reranker mutates a scored candidate; once it is selected it
/// becomes a [`Recommendation`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    item: CandidateItem,
    combined_score: f32,
    contributions: Vec<Contribution>,
}

impl ScoredCandidate {
    /// Returns `None` when there are no contributions, since no score can be
    /// derived from an empty list.
    pub fn new(
        item: CandidateItem,
        combined_score: f32,
        contributions: Vec<Contribution>,
    ) -> Option<Self> {
        if contributions.is_empty() || !combined_score.is_finite() {
            return None;
        }
        Some(Self {
            item,
            combined_score,
            contributions,
        })
    }

    pub fn item(&self) -> &CandidateItem {
        &self.item
    }

    pub fn combined_score(&self) -> f32 {
        self.combined_score
    }

    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    /// Multiplies every positive contribution whose signal is in `spent` by
    /// `factor` and recomputes the score as the mean of the contributions.
    ///
    /// Negative similarities are left alone: scaling them toward zero would
    /// raise the score.
    pub(crate) fn decay(&mut self, spent: &[&str], factor: f32) {
        for contribution in &mut self.contributions {
            if contribution.similarity > 0.0
                && spent.contains(&contribution.signal_text.as_str())
            {
                contribution.similarity *= factor;
            }
        }
        self.combined_score = self
            .contributions
            .iter()
            .map(|c| c.similarity)
            .sum::<f32>()
            / self.contributions.len() as f32;
    }
}

/// A finalized recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: u64,
    pub title: String,
    pub combined_score: f32,
    pub overview: String,
    pub contributions: Vec<Contribution>,
}

impl From<ScoredCandidate> for Recommendation {
    fn from(scored: ScoredCandidate) -> Self {
        Self {
            id: scored.item.id,
            title: scored.item.title,
            combined_score: scored.combined_score,
            overview: scored.item.overview,
            contributions: scored.contributions,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_movie(id: u64, title: &str) -> CandidateItem {
    CandidateItem {
        id,
        title: title.to_string(),
        overview: String::new(),
        tagline: String::new(),
        genres: vec![],
        keywords: vec![],
        director: None,
        vote_average: 0.0,
        vote_count: 0,
        popularity: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptive_text_joins_fields() {
        let mut movie = test_movie(1, "Inception");
        movie.tagline = "Your mind is the scene of the crime".to_string();
        movie.overview = "A thief steals secrets".to_string();
        movie.genres = vec!["Action".to_string(), "Science Fiction".to_string()];
        movie.keywords = vec!["dream".to_string(), "heist".to_string()];

        assert_eq!(
            movie.descriptive_text(),
            "Inception Your mind is the scene of the crime A thief steals secrets \
             Action Science Fiction dream heist"
        );
    }

    #[test]
    fn test_scored_candidate_rejects_empty_contributions() {
        assert!(ScoredCandidate::new(test_movie(1, "Empty"), 0.5, vec![]).is_none());
    }

    #[test]
    fn test_scored_candidate_rejects_nan_score() {
        let contributions = vec![Contribution::new("cats", 0.5)];
        assert!(ScoredCandidate::new(test_movie(1, "NaN"), f32::NAN, contributions).is_none());
    }

    #[test]
    fn test_decay_only_touches_spent_signals() {
        let mut scored = ScoredCandidate::new(
            test_movie(2, "B"),
            0.6,
            vec![Contribution::new("cats", 0.5), Contribution::new("dogs", 0.7)],
        )
        .unwrap();

        scored.decay(&["cats"], 0.8);

        assert!((scored.contributions()[0].similarity - 0.4).abs() < 1e-6);
        assert!((scored.contributions()[1].similarity - 0.7).abs() < 1e-6);
        assert!((scored.combined_score() - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_recommendation_from_scored_candidate() {
        let mut movie = test_movie(42, "Paddington");
        movie.overview = "A bear in London".to_string();
        let scored =
            ScoredCandidate::new(movie, 0.7, vec![Contribution::new("funny bears", 0.7)]).unwrap();

        let recommendation = Recommendation::from(scored);
        assert_eq!(recommendation.id, 42);
        assert_eq!(recommendation.title, "Paddington");
        assert_eq!(recommendation.overview, "A bear in London");
        assert_eq!(recommendation.contributions.len(), 1);
    }

    #[test]
    fn test_history_record_deserialization() {
        let json = r#"{
            "url": "https://www.youtube.com/watch?v=abc",
            "title": "Funny Cats Compilation",
            "visit_count": 3,
            "visit_time": "2024-03-01T12:00:00Z"
        }"#;

        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.title.as_deref(), Some("Funny Cats Compilation"));
        assert_eq!(record.visit_count, 3);
    }
}
