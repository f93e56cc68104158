//! Free-form search box input → corpus filter.
//!
//! Input wrapped in matching quotes asks for the exact phrase (`corpus=`);
//! anything else becomes `corpus__contains`. Punctuation other than `_` and
//! `-` is removed, as is a dangling trailing `AND`/`OR`.

use docsync_search::CORPUS_FIELD;

use crate::error::QueryError;
use crate::search_query::SearchQuery;

const QUOTES: [char; 2] = ['\'', '"'];
const ALLOWED_PUNCTUATION: [char; 2] = ['_', '-'];
const OPERATOR_TOKENS: [&str; 2] = ["OR", "AND"];

fn is_wrapped_in_quotes(text: &str) -> bool {
    match (text.chars().next(), text.chars().last()) {
        (Some(first), Some(last)) => text.chars().count() > 1 && QUOTES.contains(&first) && first == last,
        _ => false,
    }
}

fn strip_surrounding_quotes(text: &str) -> &str {
    match text.chars().next() {
        Some(quote) if is_wrapped_in_quotes(text) => text.trim_matches(quote),
        _ => text,
    }
}

fn strip_special_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation() || ALLOWED_PUNCTUATION.contains(c))
        .collect()
}

fn strip_trailing_operator(text: &str) -> String {
    let trimmed = text.trim_end();
    match trimmed.rsplit_once(char::is_whitespace) {
        Some((head, last)) if OPERATOR_TOKENS.contains(&last) => head.trim_end().to_string(),
        None if OPERATOR_TOKENS.contains(&trimmed) => String::new(),
        _ => text.to_string(),
    }
}

/// Clean search box input, returning the text and whether it was quoted.
pub fn sanitize(input: &str) -> (String, bool) {
    let input = input.trim();
    let exact = is_wrapped_in_quotes(input);
    let unquoted = strip_surrounding_quotes(input);
    let cleaned = strip_trailing_operator(&strip_special_characters(unquoted));
    (cleaned.trim().to_string(), exact)
}

/// Narrow `query` by search box input matched against the corpus field.
/// Blank input (before or after cleaning) leaves the query unchanged.
pub fn filter_search(query: &SearchQuery, input: &str) -> Result<SearchQuery, QueryError> {
    let (text, exact) = sanitize(input);
    if text.is_empty() {
        return Ok(query.clone());
    }

    if exact {
        query.filter(CORPUS_FIELD, text)
    } else {
        query.filter(&format!("{}__contains", CORPUS_FIELD), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_is_exact() {
        assert_eq!(sanitize("\"donald duck\""), ("donald duck".to_string(), true));
        assert_eq!(sanitize("'donald'"), ("donald".to_string(), true));
        assert_eq!(sanitize("'donald\""), ("donald".to_string(), false));
    }

    #[test]
    fn test_punctuation_stripped() {
        assert_eq!(sanitize("what? (really)!"), ("what really".to_string(), false));
        assert_eq!(sanitize("snake_case-name"), ("snake_case-name".to_string(), false));
    }

    #[test]
    fn test_trailing_operator_stripped() {
        assert_eq!(sanitize("python OR"), ("python".to_string(), false));
        assert_eq!(sanitize("python AND "), ("python".to_string(), false));
        assert_eq!(sanitize("python or"), ("python or".to_string(), false));
        assert_eq!(sanitize("TORO"), ("TORO".to_string(), false));
        assert_eq!(sanitize("OR"), ("".to_string(), false));
    }

    #[test]
    fn test_single_quote_char_is_not_wrapped() {
        assert!(!is_wrapped_in_quotes("\""));
        assert!(!is_wrapped_in_quotes(""));
    }
}
