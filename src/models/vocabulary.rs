//! Classification vocabulary: hashtag, keyword and venue tables.
//!
//! The tables are built once at start-up (from defaults or the `[vocabulary]`
//! section of `config.toml`) and shared read-only by every classifier.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Country;

/// Evidence terms for one host country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryTerms {
    pub country: Country,

    /// Lowercase hashtags counted as country evidence (may overlap shared ones)
    #[serde(default)]
    pub hashtags: Vec<String>,

    /// Free-text keywords, weight 1 per hit
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Venue and city names, weight 2 per hit
    #[serde(default)]
    pub venues: Vec<String>,

    /// Hashtags used to build the search query for this country
    #[serde(default)]
    pub search_hashtags: Vec<String>,
}

/// Immutable classification tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Per-country terms, in tie-break priority order
    #[serde(default = "defaults::countries")]
    pub countries: Vec<CountryTerms>,

    /// Hashtags that speak for the whole event rather than one country
    #[serde(default = "defaults::shared_hashtags")]
    pub shared_hashtags: Vec<String>,

    /// Generic event substrings that mark CHAN-General content
    #[serde(default = "defaults::event_indicators")]
    pub event_indicators: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            countries: defaults::countries(),
            shared_hashtags: defaults::shared_hashtags(),
            event_indicators: defaults::event_indicators(),
        }
    }
}

impl Vocabulary {
    /// Terms for a given country.
    pub fn terms(&self, country: Country) -> Option<&CountryTerms> {
        self.countries.iter().find(|t| t.country == country)
    }

    /// Whether a (lowercase) hashtag is in the shared set.
    pub fn is_shared_hashtag(&self, hashtag: &str) -> bool {
        self.shared_hashtags.iter().any(|h| h == hashtag)
    }

    /// Countries in tie-break priority order.
    ///
    /// Table order in the file does not matter; priority always follows
    /// [`Country`] declaration order.
    pub fn ordered(&self) -> Vec<&CountryTerms> {
        let mut terms: Vec<&CountryTerms> = self.countries.iter().collect();
        terms.sort_by_key(|t| t.country);
        terms
    }

    /// Check table invariants.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for terms in &self.countries {
            if !seen.insert(terms.country) {
                return Err(AppError::validation(format!(
                    "vocabulary lists {} more than once",
                    terms.country
                )));
            }
            check_hashtags(&terms.hashtags, terms.country.name())?;
            check_lowercase(&terms.keywords, terms.country.name())?;
            check_lowercase(&terms.venues, terms.country.name())?;
        }
        for country in Country::ALL {
            if !seen.contains(&country) {
                return Err(AppError::validation(format!(
                    "vocabulary has no entry for {country}"
                )));
            }
        }
        check_hashtags(&self.shared_hashtags, "shared_hashtags")?;
        check_lowercase(&self.event_indicators, "event_indicators")?;
        Ok(())
    }
}

fn check_lowercase(terms: &[String], table: &str) -> Result<()> {
    for term in terms {
        if term.trim().is_empty() {
            return Err(AppError::validation(format!("{table}: empty term")));
        }
        if *term != term.to_lowercase() {
            return Err(AppError::validation(format!(
                "{table}: '{term}' must be lowercase"
            )));
        }
    }
    Ok(())
}

fn check_hashtags(hashtags: &[String], table: &str) -> Result<()> {
    check_lowercase(hashtags, table)?;
    if let Some(bad) = hashtags.iter().find(|h| !h.starts_with('#')) {
        return Err(AppError::validation(format!(
            "{table}: hashtag '{bad}' must start with '#'"
        )));
    }
    Ok(())
}

mod defaults {
    use super::CountryTerms;
    use crate::models::Country;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    pub fn countries() -> Vec<CountryTerms> {
        vec![
            CountryTerms {
                country: Country::Kenya,
                hashtags: strings(&[
                    "#chan2024",
                    "#totalenergieschan2024",
                    "#pamoja",
                    "#harambeestars",
                ]),
                keywords: strings(&[
                    "kenya",
                    "harambee",
                    "stars",
                    "nairobi",
                    "teamkenya",
                    "ke",
                    "harambeefc",
                    "harambeestars",
                ]),
                venues: strings(&["nairobi", "kasarani", "nyayo", "moi"]),
                search_hashtags: strings(&["#CHAN2024", "#TotalEnergiesCHAN2024", "#HarambeeStars"]),
            },
            CountryTerms {
                country: Country::Uganda,
                hashtags: strings(&[
                    "#totalenergieschan2024",
                    "#chan2024",
                    "#pamoja",
                    "#ugandacranes",
                ]),
                keywords: strings(&[
                    "uganda",
                    "cranes",
                    "kampala",
                    "teamuganda",
                    "ug",
                    "thecranes",
                    "ugandacranes",
                ]),
                venues: strings(&["kampala", "nakivubo", "mandela", "namboole"]),
                search_hashtags: strings(&["#TotalEnergiesCHAN2024", "#CHAN2024", "#UgandaCranes"]),
            },
            CountryTerms {
                country: Country::Tanzania,
                hashtags: strings(&[
                    "#chan2024",
                    "#totalenergieschan2024",
                    "#pamoja",
                    "#taifastars",
                ]),
                keywords: strings(&[
                    "tanzania",
                    "taifa",
                    "stars",
                    "dar",
                    "teamtanzania",
                    "tz",
                    "taifastars",
                    "simba",
                ]),
                venues: strings(&["dar es salaam", "mkapa", "uhuru", "azam"]),
                search_hashtags: strings(&["#CHAN2024", "#TotalEnergiesCHAN2024", "#TaifaStars"]),
            },
        ]
    }

    pub fn shared_hashtags() -> Vec<String> {
        strings(&[
            "#pamoja",
            "#chan2024",
            "#totalenergieschan2024",
            "#eastafrica",
            "#eac",
        ])
    }

    pub fn event_indicators() -> Vec<String> {
        strings(&["chan", "african nations championship", "caf", "totalenergies"])
    }
}
