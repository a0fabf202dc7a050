//! Greedy decay reranking.
//!
//! Repeatedly picks the highest-scoring candidate, then decays every
//! remaining contribution that came from a signal the pick already used.
//! Candidates that would rank high only on the strength of the same browsing
//! signals sink, which spreads the final list across different interests.

use crate::models::{Recommendation, ScoredCandidate};

pub struct DecayReranker {
    decay_factor: f32,
}

impl Default for DecayReranker {
    fn default() -> Self {
        Self { decay_factor: 0.8 }
    }
}

impl DecayReranker {
    pub fn new(decay_factor: f32) -> Self {
        Self { decay_factor }
    }

    /// Starts a rerank over `scored`, which must be in discovery order.
    pub fn start(&self, scored: Vec<ScoredCandidate>) -> RerankLoop {
        RerankLoop {
            slots: scored.into_iter().map(Some).collect(),
            decay_factor: self.decay_factor,
        }
    }

    /// Runs the loop to completion. The output is a permutation of the input.
    pub fn rerank(&self, scored: Vec<ScoredCandidate>) -> Vec<Recommendation> {
        let count = scored.len();
        let ranked: Vec<Recommendation> = self.start(scored).collect();

        tracing::debug!(
            candidates = count,
            decay_factor = self.decay_factor,
            "Rerank completed"
        );

        ranked
    }
}

/// Working set of a rerank in progress.
///
/// Slots keep their original index; a selected slot is emptied and its
/// candidate leaves the loop as a [`Recommendation`], so it can no longer be
/// decayed.
pub struct RerankLoop {
    slots: Vec<Option<ScoredCandidate>>,
    decay_factor: f32,
}

impl RerankLoop {
    /// Candidates not selected yet, in discovery order
    pub fn remaining(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.slots.iter().flatten()
    }

    /// Highest score wins; on a tie the earliest slot wins
    fn best_slot(&self) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(candidate) = slot else { continue };
            let score = candidate.combined_score();
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }
        best.map(|(index, _)| index)
    }
}

impl Iterator for RerankLoop {
    type Item = Recommendation;

    fn next(&mut self) -> Option<Recommendation> {
        let index = self.best_slot()?;
        let selected = self.slots[index].take()?;

        let spent: Vec<&str> = selected
            .contributions()
            .iter()
            .map(|c| c.signal_text.as_str())
            .collect();

        for candidate in self.slots.iter_mut().flatten() {
            candidate.decay(&spent, self.decay_factor);
        }

        Some(Recommendation::from(selected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{test_movie, Contribution};
    use std::collections::HashMap;

    const EPS: f32 = 1e-5;

    fn scored(id: u64, score: f32, contributions: &[(&str, f32)]) -> ScoredCandidate {
        ScoredCandidate::new(
            test_movie(id, &format!("Movie {}", id)),
            score,
            contributions
                .iter()
                .map(|(text, similarity)| Contribution::new(*text, *similarity))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_shared_signal_decays() {
        let reranker = DecayReranker::default();
        let mut rerank = reranker.start(vec![
            scored(1, 0.9, &[("cats", 0.9), ("dogs", 0.8)]),
            scored(2, 0.55, &[("cats", 0.5), ("birds", 0.6)]),
        ]);

        let first = rerank.next().unwrap();
        assert_eq!(first.id, 1);

        let b = rerank.remaining().next().unwrap();
        let cats = b
            .contributions()
            .iter()
            .find(|c| c.signal_text == "cats")
            .unwrap();
        assert!((cats.similarity - 0.4).abs() < EPS);
        assert!((b.combined_score() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_selected_candidate_is_not_decayed() {
        let reranker = DecayReranker::default();
        let ranked = reranker.rerank(vec![
            scored(1, 0.9, &[("cats", 0.9)]),
            scored(2, 0.8, &[("cats", 0.8)]),
        ]);

        assert_eq!(ranked[0].contributions[0].similarity, 0.9);
        assert!((ranked[1].contributions[0].similarity - 0.64).abs() < EPS);
    }

    #[test]
    fn test_rerank_is_permutation() {
        let input = vec![
            scored(1, 0.9, &[("a", 0.9), ("b", 0.7)]),
            scored(2, 0.85, &[("a", 0.85)]),
            scored(3, 0.8, &[("c", 0.8)]),
            scored(4, 0.7, &[("b", 0.7), ("c", 0.6)]),
            scored(5, 0.6, &[("d", 0.6)]),
        ];
        let mut expected: Vec<u64> = input.iter().map(|s| s.item().id).collect();

        let mut ids: Vec<u64> = DecayReranker::default()
            .rerank(input)
            .iter()
            .map(|r| r.id)
            .collect();

        expected.sort();
        ids.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_scores_never_increase_between_iterations() {
        let mut rerank = DecayReranker::default().start(vec![
            scored(1, 0.92, &[("a", 0.95), ("b", 0.9), ("c", 0.85)]),
            scored(2, 0.9, &[("a", 0.9), ("d", 0.88)]),
            scored(3, 0.85, &[("e", 0.85), ("b", 0.8)]),
            scored(4, 0.8, &[("f", 0.8)]),
        ]);

        loop {
            let before: HashMap<u64, f32> = rerank
                .remaining()
                .map(|c| (c.item().id, c.combined_score()))
                .collect();
            if rerank.next().is_none() {
                break;
            }
            for candidate in rerank.remaining() {
                assert!(candidate.combined_score() <= before[&candidate.item().id] + EPS);
            }
        }
    }

    #[test]
    fn test_negative_similarity_is_not_raised_by_decay() {
        let mut rerank = DecayReranker::default().start(vec![
            scored(1, 0.5, &[("cats", 0.5)]),
            scored(2, -0.5, &[("cats", -0.5)]),
            scored(3, 0.1, &[("cats", 0.4), ("dogs", -0.6)]),
        ]);

        rerank.next().unwrap();

        let remaining: HashMap<u64, &ScoredCandidate> =
            rerank.remaining().map(|c| (c.item().id, c)).collect();
        assert!((remaining[&2].combined_score() + 0.5).abs() < EPS);
        assert!((remaining[&2].contributions()[0].similarity + 0.5).abs() < EPS);
        // cats 0.4 -> 0.32, dogs stays -0.6
        assert!((remaining[&3].combined_score() + 0.14).abs() < EPS);
        assert!(remaining[&3].combined_score() <= 0.1);
    }

    #[test]
    fn test_diversifies_away_from_spent_signals() {
        // Movie 2 ranks second on the same signals movie 1 already used;
        // movie 3 draws on a different interest and overtakes it.
        let ranked = DecayReranker::default().rerank(vec![
            scored(1, 0.9, &[("cats", 0.9), ("kittens", 0.9)]),
            scored(2, 0.85, &[("cats", 0.85), ("kittens", 0.85)]),
            scored(3, 0.75, &[("space", 0.75), ("rockets", 0.75)]),
        ]);

        let ids: Vec<u64> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let ranked = DecayReranker::default().rerank(vec![
            scored(7, 0.5, &[("x", 0.5)]),
            scored(3, 0.5, &[("y", 0.5)]),
            scored(9, 0.5, &[("z", 0.5)]),
        ]);

        let ids: Vec<u64> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![7, 3, 9]);
    }

    #[test]
    fn test_empty_input() {
        assert!(DecayReranker::default().rerank(vec![]).is_empty());
    }

    #[test]
    fn test_runs_once_per_candidate() {
        let input: Vec<ScoredCandidate> = (0..6)
            .map(|i| scored(i, 0.5 + i as f32 / 100.0, &[("shared", 0.5)]))
            .collect();

        let mut rerank = DecayReranker::default().start(input);
        let mut iterations = 0;
        while rerank.next().is_some() {
            iterations += 1;
        }

        assert_eq!(iterations, 6);
        assert_eq!(rerank.remaining().count(), 0);
    }
}
