// Leaderboard: ordered index of (entity id, score) for top-K / bottom-K.
//
// Entries live in a BTreeMap keyed by (Reverse(score), update sequence), so
// iteration order is the ranking itself: highest score first, and among
// equal scores the entity that reached that score first. `highest` reads the
// front of the map and `lowest` reads the back, which keeps the two queries
// disjoint whenever the population is at least 2k.
//
// Updates are differential: the caller passes the old score it already has
// (from ScoreAggregator) so the entry can be removed and reinserted at its
// new rank without a second lookup.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::warn;

use crate::scoring::policy::Score;

type RankKey = (Reverse<Score>, u64);

/// One row of a leaderboard query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub score: Score,
}

/// Order-statistics index over one kind of entity.
#[derive(Debug, Default)]
pub struct Leaderboard {
    ranked: BTreeMap<RankKey, String>,
    /// id → update sequence of its current entry
    sequences: HashMap<String, u64>,
    next_seq: u64,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or reposition `id` at `new_score`.
    ///
    /// Pass `old_score = None` for an entity the board has never seen and
    /// `Some(previous)` for one it already tracks. An update whose new score
    /// equals the old one leaves the ranking untouched, including tie order.
    pub fn update(&mut self, id: &str, new_score: Score, old_score: Option<Score>) {
        let Some(&seq) = self.sequences.get(id) else {
            if old_score.is_some() {
                warn!(id = id, "Leaderboard update for untracked entity, inserting");
            }
            self.insert(id, new_score);
            return;
        };

        let Some(old_score) = old_score else {
            // Seeded twice or caller lost track: treat as a reposition.
            warn!(id = id, "Leaderboard insert for tracked entity, repositioning");
            self.remove_by_seq(id, seq);
            self.insert(id, new_score);
            return;
        };

        if old_score == new_score && self.ranked.contains_key(&(Reverse(old_score), seq)) {
            return;
        }

        if self.ranked.remove(&(Reverse(old_score), seq)).is_none() {
            warn!(
                id = id,
                old = old_score.value(),
                "Stale old score on leaderboard update, searching by id"
            );
            self.remove_by_seq(id, seq);
        }
        self.insert(id, new_score);
    }

    /// The `k` highest-scored entries, descending.
    pub fn highest(&self, k: usize) -> Vec<LeaderboardEntry> {
        self.ranked
            .iter()
            .take(k)
            .map(|((Reverse(score), _), id)| LeaderboardEntry {
                id: id.clone(),
                score: *score,
            })
            .collect()
    }

    /// The `k` lowest-scored entries, ascending.
    pub fn lowest(&self, k: usize) -> Vec<LeaderboardEntry> {
        self.ranked
            .iter()
            .rev()
            .take(k)
            .map(|((Reverse(score), _), id)| LeaderboardEntry {
                id: id.clone(),
                score: *score,
            })
            .collect()
    }

    /// 1-based rank of `id` (1 = highest score).
    pub fn rank(&self, id: &str) -> Option<usize> {
        let seq = *self.sequences.get(id)?;
        self.ranked
            .iter()
            .position(|((_, s), _)| *s == seq)
            .map(|pos| pos + 1)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sequences.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    fn insert(&mut self, id: &str, score: Score) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ranked.insert((Reverse(score), seq), id.to_string());
        self.sequences.insert(id.to_string(), seq);
    }

    fn remove_by_seq(&mut self, id: &str, seq: u64) {
        self.ranked.retain(|(_, s), _| *s != seq);
        self.sequences.remove(id);
    }
}
