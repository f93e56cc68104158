//! Token producers for text fields and corpus entries.
//!
//! An indexer turns text into the list of tokens the index should match on.
//! Token order is preserved and duplicates are dropped.

use std::collections::HashSet;
use std::sync::Arc;

/// Shared indexer function.
pub type Indexer = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Wrap a plain function or closure as an [`Indexer`].
pub fn indexer<F>(f: F) -> Indexer
where
    F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn dedup(tokens: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Whitespace-separated words.
pub fn words(text: &str) -> Vec<String> {
    dedup(text.split_whitespace().map(str::to_string))
}

/// Every prefix of every word: `"Big Box"` gives `B Bi Big B Bo Box`
/// (deduplicated).
pub fn startswith(text: &str) -> Vec<String> {
    dedup(text.split_whitespace().flat_map(|word| {
        let ends: Vec<usize> = word
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .collect();
        ends.into_iter()
            .map(|end| word[..end].to_string())
            .collect::<Vec<_>>()
    }))
}

/// Every substring of every word.
pub fn contains(text: &str) -> Vec<String> {
    dedup(text.split_whitespace().flat_map(|word| {
        let bounds: Vec<usize> = word
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(word.len()))
            .collect();
        let mut subs = Vec::new();
        for (a, start) in bounds.iter().enumerate() {
            for end in &bounds[a + 1..] {
                subs.push(word[*start..*end].to_string());
            }
        }
        subs
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startswith() {
        assert_eq!(startswith("Big Box"), vec!["B", "Bi", "Big", "Bo", "Box"]);
    }

    #[test]
    fn test_contains() {
        assert_eq!(contains("abc"), vec!["a", "ab", "abc", "b", "bc", "c"]);
    }

    #[test]
    fn test_multibyte_words() {
        let tokens = contains("Boôk");
        assert!(tokens.contains(&"ô".to_string()));
        assert!(tokens.contains(&"Boôk".to_string()));
        assert_eq!(startswith("ôk"), vec!["ô", "ôk"]);
    }

    #[test]
    fn test_words_dedup() {
        assert_eq!(words("a b  a"), vec!["a", "b"]);
        assert!(words("   ").is_empty());
    }
}
