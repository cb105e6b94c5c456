// Score aggregator: one rolling window and cached score per entity.
//
// Every admitted rating goes into the entity's window, the window is folded
// back into a score by the injected Aggregation, and the caller gets both
// the previous and the new score so it can reposition the entity on a
// leaderboard without looking it up again.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::policy::{Aggregation, Rating, Score};
use super::window::RollingWindow;

/// Per-entity state: recent ratings plus the score derived from them.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub id: String,
    window: RollingWindow<Rating>,
    score: Option<Score>,
}

impl EntityRecord {
    fn new(id: &str, capacity: usize) -> Self {
        Self {
            id: id.to_string(),
            window: RollingWindow::new(capacity),
            score: None,
        }
    }

    /// The cached aggregate, if the entity has been scored or seeded.
    pub fn score(&self) -> Option<Score> {
        self.score
    }

    /// Ratings currently in the window, most recent first.
    pub fn ratings(&self) -> Vec<Rating> {
        self.window.to_ordered_ratings().copied().collect()
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

/// Result of admitting one rating: the score before and after.
///
/// `old` is `None` the first time an entity is seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreChange {
    pub old: Option<Score>,
    pub new: Score,
}

/// Tracks EntityRecords for one kind of entity (users or channels).
pub struct ScoreAggregator {
    capacity: usize,
    aggregation: Arc<dyn Aggregation>,
    records: HashMap<String, EntityRecord>,
}

impl ScoreAggregator {
    pub fn new(capacity: usize, aggregation: Arc<dyn Aggregation>) -> Self {
        Self {
            capacity,
            aggregation,
            records: HashMap::new(),
        }
    }

    /// Admit a rating for `id`, creating its record on first sight.
    pub fn update(&mut self, id: &str, rating: Rating) -> ScoreChange {
        let capacity = self.capacity;
        let record = self
            .records
            .entry(id.to_string())
            .or_insert_with(|| EntityRecord::new(id, capacity));

        record.window.insert(rating);
        let new = self.aggregation.aggregate(record.window.as_slice());
        let old = record.score.replace(new);

        debug!(
            id = id,
            rating = rating,
            old = ?old.map(Score::value),
            new = new.value(),
            window = record.window.len(),
            "Updated aggregate score"
        );

        ScoreChange { old, new }
    }

    /// Create a record with a stored score and an empty window.
    ///
    /// Used when bootstrapping from the entity directory. The seeded score
    /// stands until the first rating is admitted, at which point the score
    /// is recomputed from the window alone. Returns false if the entity is
    /// already tracked (existing records are left untouched).
    pub fn seed(&mut self, id: &str, score: Score) -> bool {
        if self.records.contains_key(id) {
            return false;
        }
        let mut record = EntityRecord::new(id, self.capacity);
        record.score = Some(score);
        self.records.insert(id.to_string(), record);
        true
    }

    pub fn get(&self, id: &str) -> Option<&EntityRecord> {
        self.records.get(id)
    }

    /// All tracked records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &EntityRecord> + '_ {
        self.records.values()
    }

    pub fn score(&self, id: &str) -> Option<Score> {
        self.records.get(id).and_then(EntityRecord::score)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
