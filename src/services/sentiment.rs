// src/services/sentiment.rs

//! Sentiment scoring.
//!
//! The default scorer is VADER (valence lexicon plus rules for boosters,
//! negation, capitalization, contrastive "but" and emoji). The pipeline
//! feeds it text that went through `clean_text`, so punctuation emphasis is
//! already gone by the time a tweet is scored.

use vader_sentiment::SentimentIntensityAnalyzer;

use crate::models::SentimentLabel;

/// Source of compound polarity scores.
pub trait SentimentScorer: Send + Sync {
    /// Compound polarity in [-1, 1].
    fn polarity(&self, text: &str) -> f64;

    /// Compound score and its label.
    fn analyze(&self, text: &str) -> (f64, SentimentLabel) {
        let compound = self.polarity(text);
        (compound, SentimentLabel::from_compound(compound))
    }
}

/// VADER compound scorer over the bundled lexicon.
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for VaderScorer {
    fn polarity(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(text);
        scores
            .get("compound")
            .copied()
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::text::clean_text;

    fn score(text: &str) -> f64 {
        VaderScorer::new().polarity(text)
    }

    #[test]
    fn test_positive_text() {
        let (compound, label) =
            VaderScorer::new().analyze("Thrilled and delighted with this fabulous squad");
        assert!(compound > 0.5, "{compound}");
        assert_eq!(label, SentimentLabel::Positive);
    }

    #[test]
    fn test_negative_text() {
        let (compound, label) = VaderScorer::new().analyze("terrible defending and a sad loss");
        assert!(compound < -0.5, "{compound}");
        assert_eq!(label, SentimentLabel::Negative);
    }

    #[test]
    fn test_empty_text_is_neutral() {
        assert_eq!(VaderScorer::new().analyze(""), (0.0, SentimentLabel::Neutral));
        assert_eq!(score("   "), 0.0);
    }

    #[test]
    fn test_negation_flips_polarity() {
        assert!(score("good") > 0.0);
        assert!(score("not good") < 0.0);
    }

    #[test]
    fn test_booster_intensifies() {
        assert!(score("very good") > score("good"));
    }

    #[test]
    fn test_cleaned_text_loses_exclamation_emphasis() {
        let cleaned = clean_text("Great match!!! #CHAN2024");
        assert_eq!(cleaned, "Great match");
        assert_eq!(score(&cleaned), score("Great match"));
    }

    #[test]
    fn test_compound_bounded() {
        let compound = score("best best best best best best best best best best");
        assert!(compound <= 1.0 && compound > 0.9);
    }
}
