// Scoring policy: the swap-ready seam between text and numbers.
//
// The engine never looks inside a rating. It asks a MessageRater for one
// rating per message and an Aggregation for one score per window. Both must
// be pure: the aggregator caches scores and never recomputes them on read.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::lexicon::LexiconRater;

/// Per-message output of the rater.
pub type Rating = f64;

/// An aggregate Psycho-Pass (crime coefficient) for a user or channel.
///
/// Wraps f64 with a total order so scores can key ordered collections.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(pub f64);

impl Score {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Score(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Turns a single message's text into a rating.
pub trait MessageRater: Send + Sync {
    fn rate(&self, text: &str) -> Rating;
}

/// Folds a window of ratings (most recent first) into one score.
///
/// Implementations must be deterministic for any window length, including
/// an empty one.
pub trait Aggregation: Send + Sync {
    fn aggregate(&self, ratings: &[Rating]) -> Score;
}

/// Arithmetic mean of the window. Empty windows score 0.
pub struct MeanAggregation;

impl Aggregation for MeanAggregation {
    fn aggregate(&self, ratings: &[Rating]) -> Score {
        if ratings.is_empty() {
            return Score(0.0);
        }
        Score(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }
}

/// Exponentially decayed weighted mean. The most recent rating has weight 1,
/// each older rating is worth `decay` times the one before it.
pub struct DecayAggregation {
    pub decay: f64,
}

impl Default for DecayAggregation {
    fn default() -> Self {
        Self { decay: 0.9 }
    }
}

impl Aggregation for DecayAggregation {
    fn aggregate(&self, ratings: &[Rating]) -> Score {
        let mut weight = 1.0;
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for rating in ratings {
            weighted_sum += rating * weight;
            total_weight += weight;
            weight *= self.decay;
        }
        if total_weight == 0.0 {
            return Score(0.0);
        }
        Score(weighted_sum / total_weight)
    }
}

/// The full policy injected into the engine: one rater plus separate
/// aggregations for users and channels.
#[derive(Clone)]
pub struct ScoringPolicy {
    pub rater: Arc<dyn MessageRater>,
    pub user_aggregation: Arc<dyn Aggregation>,
    pub channel_aggregation: Arc<dyn Aggregation>,
}

impl ScoringPolicy {
    pub fn rate(&self, text: &str) -> Rating {
        self.rater.rate(text)
    }
}

impl Default for ScoringPolicy {
    /// Lexicon rater, plain mean for users, recency-weighted mean for channels.
    fn default() -> Self {
        Self {
            rater: Arc::new(LexiconRater::default()),
            user_aggregation: Arc::new(MeanAggregation),
            channel_aggregation: Arc::new(DecayAggregation::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(MeanAggregation.aggregate(&[]), Score(0.0));
    }

    #[test]
    fn test_mean() {
        let score = MeanAggregation.aggregate(&[60.0, 50.0, 40.0, 30.0, 20.0]);
        assert!((score.value() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_decay_favours_recent() {
        let agg = DecayAggregation { decay: 0.5 };
        // weights 1, 0.5 -> (100 + 0) / 1.5
        let score = agg.aggregate(&[100.0, 0.0]);
        assert!((score.value() - 66.666_666).abs() < 1e-3, "got {score}");
    }

    #[test]
    fn test_decay_of_constant_window_is_constant() {
        let agg = DecayAggregation::default();
        let score = agg.aggregate(&[42.0; 30]);
        assert!((score.value() - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_total_order() {
        let mut scores = vec![Score(3.0), Score(-1.0), Score(2.5)];
        scores.sort();
        assert_eq!(scores, vec![Score(-1.0), Score(2.5), Score(3.0)]);
    }

    #[test]
    fn test_score_display_one_decimal() {
        assert_eq!(Score(87.26).to_string(), "87.3");
        assert_eq!(Score(120.0).to_string(), "120.0");
    }
}
