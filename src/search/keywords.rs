use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const MIN_KEYWORD_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "her",
    "his", "how", "if", "in", "into", "is", "it", "its", "may", "more", "most", "not", "of", "on",
    "or", "other", "our", "out", "over", "she", "should", "so", "some", "such", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "up", "very", "was", "were", "what", "when", "where", "which", "while", "who",
    "will", "with", "would", "you", "your",
];

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("Invalid regex"))
}

/// Lowercased search keywords from `texts`, in first-seen order.
///
/// Stop words and tokens shorter than three characters are dropped.
#[must_use]
pub fn extract(texts: &[&str], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for text in texts {
        for token in word_regex().find_iter(text) {
            if keywords.len() >= max {
                return keywords;
            }

            let word = token.as_str().to_lowercase();
            if word.chars().count() < MIN_KEYWORD_LEN || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            if seen.insert(word.clone()) {
                keywords.push(word);
            }
        }
    }

    keywords
}

/// Splits a user query into the terms matched against the index.
#[must_use]
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    word_regex()
        .find_iter(query)
        .map(|m| m.as_str().to_lowercase())
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_drops_stop_words_and_short_tokens() {
        let keywords = extract(&["The Quick brown fox", "and the QUICK dog, v2"], 50);
        assert_eq!(keywords, vec!["quick", "brown", "fox", "dog"]);
    }

    #[test]
    fn test_extract_respects_cap() {
        let keywords = extract(&["alpha beta gamma delta epsilon"], 3);
        assert_eq!(keywords, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_query_terms() {
        assert_eq!(query_terms("  Getting Started!"), vec!["getting", "started"]);
        assert!(query_terms("  ").is_empty());
    }
}
