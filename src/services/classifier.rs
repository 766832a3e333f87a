// src/services/classifier.rs

//! Country/category classification cascade.
//!
//! Evidence is checked in priority order and the first decisive stage wins:
//!
//! 1. Country hashtags. A tie made entirely of shared hashtags is broken by
//!    text evidence, or becomes `Pamoja` when there is none.
//! 2. Keywords (weight 1) and venues (weight 2), accumulated in one map.
//! 3. Generic event indicators or shared hashtags give `CHAN-General`.
//! 4. Everything else is `General`.
//!
//! Equal scores resolve by [`Country`] priority (Kenya, Uganda, Tanzania).
//! Classification is pure and never fails; hashtags must already be
//! lowercase `#` tokens.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::models::{Category, Country, Vocabulary};

/// Weight of a keyword hit.
const KEYWORD_WEIGHT: usize = 1;
/// Weight of a venue hit.
const VENUE_WEIGHT: usize = 2;

/// Per-country evidence scores, iterated in priority order.
pub type Scores = BTreeMap<Country, usize>;

/// The cascade stage that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Country hashtags outweighed shared hashtags
    CountryHashtag,
    /// Shared-hashtag tie broken by keyword/venue evidence
    SharedTieBreak,
    /// Shared-hashtag tie with no text evidence
    SharedOnly,
    /// Keyword and venue evidence
    Keyword,
    /// Generic event mention
    EventIndicator,
    /// No evidence at all
    Fallback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CountryHashtag => "country_hashtag",
            Stage::SharedTieBreak => "shared_tie_break",
            Stage::SharedOnly => "shared_only",
            Stage::Keyword => "keyword",
            Stage::EventIndicator => "event_indicator",
            Stage::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// A classification result with the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub category: Category,
    pub stage: Stage,
    /// Scores consulted by the deciding stage (empty for the fallbacks)
    pub scores: Scores,
}

/// Rule-based classifier over an immutable vocabulary.
#[derive(Debug, Clone)]
pub struct Classifier {
    vocabulary: Arc<Vocabulary>,
}

impl Classifier {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Classify a tweet into exactly one category.
    pub fn classify(&self, text: &str, hashtags: &[String]) -> Category {
        self.classify_detailed(text, hashtags).category
    }

    /// Classify a tweet and report which stage decided it.
    pub fn classify_detailed(&self, text: &str, hashtags: &[String]) -> Verdict {
        let all_content = format!("{} {}", text.to_lowercase(), hashtags.join(" "));

        let hashtag_scores = self.hashtag_scores(hashtags);
        if let Some(country_specific) = hashtag_scores.values().copied().max() {
            let shared_count = hashtags
                .iter()
                .filter(|h| self.vocabulary.is_shared_hashtag(h))
                .count();

            if shared_count > 0 && country_specific == shared_count {
                let text_scores = self.text_scores(&all_content);
                return match best(&text_scores) {
                    Some(country) => Verdict {
                        category: country.into(),
                        stage: Stage::SharedTieBreak,
                        scores: text_scores,
                    },
                    None => Verdict {
                        category: Category::Pamoja,
                        stage: Stage::SharedOnly,
                        scores: hashtag_scores,
                    },
                };
            }

            if let Some(country) = best(&hashtag_scores) {
                return Verdict {
                    category: country.into(),
                    stage: Stage::CountryHashtag,
                    scores: hashtag_scores,
                };
            }
        }

        let text_scores = self.text_scores(&all_content);
        if let Some(country) = best(&text_scores) {
            return Verdict {
                category: country.into(),
                stage: Stage::Keyword,
                scores: text_scores,
            };
        }

        let has_event_mention = self
            .vocabulary
            .event_indicators
            .iter()
            .any(|indicator| all_content.contains(indicator.as_str()));
        let has_shared_hashtag = self
            .vocabulary
            .shared_hashtags
            .iter()
            .any(|shared| all_content.contains(shared.as_str()));

        if has_event_mention || has_shared_hashtag {
            return Verdict {
                category: Category::ChanGeneral,
                stage: Stage::EventIndicator,
                scores: Scores::new(),
            };
        }

        Verdict {
            category: Category::General,
            stage: Stage::Fallback,
            scores: Scores::new(),
        }
    }

    /// Count each country's table hashtags present in the input.
    fn hashtag_scores(&self, hashtags: &[String]) -> Scores {
        self.vocabulary
            .ordered()
            .into_iter()
            .filter_map(|terms| {
                let matches = terms
                    .hashtags
                    .iter()
                    .filter(|tag| hashtags.contains(tag))
                    .count();
                (matches > 0).then_some((terms.country, matches))
            })
            .collect()
    }

    /// Keyword and venue evidence accumulated into one map.
    fn text_scores(&self, all_content: &str) -> Scores {
        let mut scores = Scores::new();
        for terms in self.vocabulary.ordered() {
            let keyword_hits = count_hits(&terms.keywords, all_content);
            let venue_hits = count_hits(&terms.venues, all_content);
            let score = keyword_hits * KEYWORD_WEIGHT + venue_hits * VENUE_WEIGHT;
            if score > 0 {
                *scores.entry(terms.country).or_insert(0) += score;
            }
        }
        scores
    }
}

fn count_hits(terms: &[String], content: &str) -> usize {
    terms
        .iter()
        .filter(|term| content.contains(term.as_str()))
        .count()
}

/// Highest-scoring country; the earliest in priority order wins ties.
fn best(scores: &Scores) -> Option<Country> {
    let mut winner: Option<(Country, usize)> = None;
    for (&country, &score) in scores {
        if score > 0 && winner.is_none_or(|(_, top)| score > top) {
            winner = Some((country, score));
        }
    }
    winner.map(|(country, _)| country)
}
