//! Host countries and the category labels a tweet can receive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A CHAN 2024 host country.
///
/// Declaration order is the tie-break priority: when two countries reach the
/// same score, the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Country {
    Kenya,
    Uganda,
    Tanzania,
}

impl Country {
    /// All host countries in priority order.
    pub const ALL: [Country; 3] = [Country::Kenya, Country::Uganda, Country::Tanzania];

    /// Display name, as stored in the `country` column.
    pub fn name(&self) -> &'static str {
        match self {
            Country::Kenya => "Kenya",
            Country::Uganda => "Uganda",
            Country::Tanzania => "Tanzania",
        }
    }

    /// Lowercase key used for topic lookup.
    pub fn slug(&self) -> &'static str {
        match self {
            Country::Kenya => "kenya",
            Country::Uganda => "uganda",
            Country::Tanzania => "tanzania",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fixed classification vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Kenya,
    Uganda,
    Tanzania,
    /// Pure shared-hashtag content with no country evidence
    Pamoja,
    /// Generic event content (CAF, sponsor, championship name)
    #[serde(rename = "CHAN-General")]
    ChanGeneral,
    General,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Kenya,
        Category::Uganda,
        Category::Tanzania,
        Category::Pamoja,
        Category::ChanGeneral,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Kenya => "Kenya",
            Category::Uganda => "Uganda",
            Category::Tanzania => "Tanzania",
            Category::Pamoja => "Pamoja",
            Category::ChanGeneral => "CHAN-General",
            Category::General => "General",
        }
    }

    /// The host country this label names, if any.
    pub fn country(&self) -> Option<Country> {
        match self {
            Category::Kenya => Some(Country::Kenya),
            Category::Uganda => Some(Country::Uganda),
            Category::Tanzania => Some(Country::Tanzania),
            _ => None,
        }
    }

    /// True for content that belongs to all host countries.
    pub fn is_shared(&self) -> bool {
        matches!(self, Category::Pamoja | Category::ChanGeneral)
    }
}

impl From<Country> for Category {
    fn from(country: Country) -> Self {
        match country {
            Country::Kenya => Category::Kenya,
            Country::Uganda => Category::Uganda,
            Country::Tanzania => Category::Tanzania,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::validation(format!("unknown category '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_labels() {
        assert!(Category::Pamoja.is_shared());
        assert!(Category::ChanGeneral.is_shared());
        assert!(!Category::Kenya.is_shared());
        assert!(!Category::General.is_shared());
    }

    #[test]
    fn test_round_trip_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("Rwanda".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&Category::ChanGeneral).unwrap();
        assert_eq!(json, "\"CHAN-General\"");
    }

    #[test]
    fn test_country_priority_order() {
        assert!(Country::Kenya < Country::Uganda);
        assert!(Country::Uganda < Country::Tanzania);
        assert_eq!(Category::from(Country::Uganda).country(), Some(Country::Uganda));
    }
}
