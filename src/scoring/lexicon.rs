// Lexicon rater: the default, fully local message rater.
//
// Sums fixed weights for hostile vocabulary, then adds small bonuses for
// shouting (mostly uppercase) and piled-up exclamation marks. Zero network
// calls and no state, so the same text always gets the same rating.

use std::collections::HashMap;

use super::policy::{MessageRater, Rating};

/// Upper bound for any single rating (and therefore any aggregate).
pub const MAX_RATING: Rating = 300.0;

// Word → weight. Weights are per occurrence.
const HOSTILE_WORDS: &[(&str, f64)] = &[
    ("kill", 120.0),
    ("die", 90.0),
    ("murder", 120.0),
    ("destroy", 60.0),
    ("hate", 60.0),
    ("idiot", 45.0),
    ("stupid", 40.0),
    ("moron", 45.0),
    ("dumb", 30.0),
    ("loser", 35.0),
    ("shut", 20.0),
    ("useless", 30.0),
    ("pathetic", 35.0),
    ("worthless", 45.0),
    ("trash", 30.0),
    ("garbage", 30.0),
    ("angry", 20.0),
    ("furious", 35.0),
    ("damn", 15.0),
    ("hell", 10.0),
    ("crap", 15.0),
    ("ugh", 10.0),
    ("annoying", 15.0),
    ("terrible", 20.0),
    ("awful", 20.0),
];

const SHOUT_MIN_LETTERS: usize = 8;
const SHOUT_UPPER_RATIO: f64 = 0.7;
const SHOUT_BONUS: f64 = 30.0;
const EXCLAMATION_BONUS: f64 = 5.0;
const EXCLAMATION_CAP: usize = 6;

/// Word-weight rater with shouting and exclamation bonuses.
pub struct LexiconRater {
    weights: HashMap<&'static str, f64>,
}

impl Default for LexiconRater {
    fn default() -> Self {
        Self {
            weights: HOSTILE_WORDS.iter().copied().collect(),
        }
    }
}

impl LexiconRater {
    fn word_weight(&self, text: &str) -> f64 {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| {
                let lower = w.to_lowercase();
                self.weights.get(lower.as_str()).copied().unwrap_or(0.0)
            })
            .sum()
    }
}

impl MessageRater for LexiconRater {
    fn rate(&self, text: &str) -> Rating {
        let mut rating = self.word_weight(text);

        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.len() >= SHOUT_MIN_LETTERS {
            let upper = letters.iter().filter(|c| c.is_uppercase()).count();
            if upper as f64 / letters.len() as f64 >= SHOUT_UPPER_RATIO {
                rating += SHOUT_BONUS;
            }
        }

        let exclamations = text.chars().filter(|&c| c == '!').count();
        rating += exclamations.min(EXCLAMATION_CAP) as f64 * EXCLAMATION_BONUS;

        rating.clamp(0.0, MAX_RATING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_text_rates_zero() {
        let rater = LexiconRater::default();
        assert_eq!(rater.rate("good morning, standup in five"), 0.0);
        assert_eq!(rater.rate(""), 0.0);
    }

    #[test]
    fn test_hostile_words_are_case_insensitive() {
        let rater = LexiconRater::default();
        assert_eq!(rater.rate("you idiot"), 45.0);
        assert_eq!(rater.rate("You Idiot"), 45.0);
    }

    #[test]
    fn test_shouting_bonus() {
        let rater = LexiconRater::default();
        // 8+ letters, all caps, no hostile words
        assert_eq!(rater.rate("WHERE IS THE REPORT"), SHOUT_BONUS);
        // too short to count as shouting
        assert_eq!(rater.rate("OK"), 0.0);
    }

    #[test]
    fn test_exclamations_are_capped() {
        let rater = LexiconRater::default();
        assert_eq!(rater.rate("fine!"), 5.0);
        assert_eq!(rater.rate("fine!!!!!!!!!!!!!!!!"), 30.0);
    }

    #[test]
    fn test_rating_is_clamped() {
        let rater = LexiconRater::default();
        let rating = rater.rate("kill kill kill kill murder die");
        assert_eq!(rating, MAX_RATING);
    }

    #[test]
    fn test_rating_is_deterministic() {
        let rater = LexiconRater::default();
        let text = "this is STUPID and I hate it!!";
        assert_eq!(rater.rate(text), rater.rate(text));
    }
}
