// src/services/text.rs

//! Tweet text preprocessing.
//!
//! Produces the normalized text fed to the sentiment scorer and pulls
//! hashtags and mentions out of the raw text for classification.

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+|https\S+").expect("valid url regex"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+|#\w+").expect("valid tag regex"));

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("valid hashtag regex"));

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("valid mention regex"));

// Anything that is not a word char, whitespace, or a pictograph/flag emoji.
static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[^\w\s\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}\x{1F1E0}-\x{1F1FF}]",
    )
    .expect("valid punctuation regex")
});

/// Clean tweet text for sentiment scoring.
///
/// Removes URLs, mentions and hashtags, collapses whitespace and strips
/// punctuation while keeping emoji.
pub fn clean_text(text: &str) -> String {
    let without_urls = URL_RE.replace_all(text, "");
    let without_tags = TAG_RE.replace_all(&without_urls, "");
    let collapsed = without_tags.split_whitespace().collect::<Vec<_>>().join(" ");
    PUNCT_RE.replace_all(&collapsed, "").trim().to_string()
}

/// Extract lowercase `#hashtag` tokens in order of appearance.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    HASHTAG_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extract lowercase `@mention` tokens in order of appearance.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    MENTION_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_noise() {
        let cleaned = clean_text("Great match!!! 😀 @fifa #CHAN2024 https://t.co/abc");
        assert_eq!(cleaned, "Great match 😀");
    }

    #[test]
    fn test_clean_text_removes_www_links() {
        assert_eq!(clean_text("see www.cafonline.com now"), "see now");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("#only @tags"), "");
    }

    #[test]
    fn test_extract_hashtags_lowercases() {
        let tags = extract_hashtags("Go #HarambeeStars! #CHAN2024 and #Pamoja");
        assert_eq!(tags, vec!["#harambeestars", "#chan2024", "#pamoja"]);
    }

    #[test]
    fn test_extract_hashtags_keeps_duplicates() {
        let tags = extract_hashtags("#Pamoja #pamoja");
        assert_eq!(tags, vec!["#pamoja", "#pamoja"]);
    }

    #[test]
    fn test_extract_mentions() {
        let mentions = extract_mentions("Thanks @CAF_Online and @FKF_Media");
        assert_eq!(mentions, vec!["@caf_online", "@fkf_media"]);
    }
}
