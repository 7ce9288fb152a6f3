//! Text tokenizer for indexing and queries
//!
//! Pipeline: lowercase → split on anything that is not a letter or digit
//!           → drop empty runs
//!
//! Letters of every alphabet count (Latin, Cyrillic, ...), so `"Ёлка-2"`
//! yields `["ёлка", "2"]`. Prefix and n-gram helpers work on char
//! boundaries, never on bytes.

/// Tokenize text into lowercase alphanumeric runs.
///
/// Total function: empty or punctuation-only input yields an empty vector.
///
/// # Example
///
/// ```
/// use quarry_engine::search::tokenize;
///
/// let tokens = tokenize("Hello, World-42!");
/// assert_eq!(tokens, vec!["hello", "world", "42"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Number of chars in a token.
#[inline]
pub fn char_len(token: &str) -> usize {
    token.chars().count()
}

/// The first `n` chars of `token` (the whole token if it is shorter).
#[inline]
pub fn char_prefix(token: &str, n: usize) -> &str {
    match token.char_indices().nth(n) {
        Some((end, _)) => &token[..end],
        None => token,
    }
}

/// Every contiguous window of `n` chars in `token`.
///
/// Yields nothing when the token is shorter than `n` or `n` is zero.
pub fn char_windows(token: &str, n: usize) -> impl Iterator<Item = &str> + '_ {
    let bounds: Vec<usize> = token
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(token.len()))
        .collect();
    let count = if n == 0 {
        0
    } else {
        bounds.len().saturating_sub(n)
    };
    (0..count).map(move |start| &token[bounds[start]..bounds[start + n]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("Hello, World!");
        assert_eq!(tokens, vec!["hello", "world"]);
    }

    #[test]
    fn test_tokenize_keeps_short_tokens() {
        let tokens = tokenize("I am a test");
        assert_eq!(tokens, vec!["i", "am", "a", "test"]);
    }

    #[test]
    fn test_tokenize_numbers() {
        let tokens = tokenize("test123 foo456bar 12");
        assert_eq!(tokens, vec!["test123", "foo456bar", "12"]);
    }

    #[test]
    fn test_tokenize_cyrillic() {
        let tokens = tokenize("Улица Ленина, д. 5");
        assert_eq!(tokens, vec!["улица", "ленина", "д", "5"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
    }

    #[test]
    fn test_tokenize_only_punctuation() {
        assert!(tokenize("...---...").is_empty());
    }

    #[test]
    fn test_char_prefix() {
        assert_eq!(char_prefix("alphabet", 3), "alp");
        assert_eq!(char_prefix("ab", 6), "ab");
        assert_eq!(char_prefix("ёлочка", 2), "ёл");
        assert_eq!(char_prefix("x", 0), "");
    }

    #[test]
    fn test_char_windows() {
        let grams: Vec<&str> = char_windows("alpha", 3).collect();
        assert_eq!(grams, vec!["alp", "lph", "pha"]);

        let grams: Vec<&str> = char_windows("дом", 3).collect();
        assert_eq!(grams, vec!["дом"]);

        assert_eq!(char_windows("ab", 3).count(), 0);
        assert_eq!(char_windows("abc", 0).count(), 0);
    }

    proptest! {
        #[test]
        fn prop_tokens_are_lowercase_alphanumeric(text in "\\PC{0,40}") {
            for token in tokenize(&text) {
                prop_assert!(!token.is_empty());
                prop_assert!(token.chars().all(|c| c.is_alphanumeric()));
                prop_assert_eq!(token.to_lowercase(), token.clone());
            }
        }

        #[test]
        fn prop_window_count(token in "[a-zа-я0-9]{0,12}", n in 1usize..5) {
            let len = char_len(&token);
            let expected = if len >= n { len - n + 1 } else { 0 };
            prop_assert_eq!(char_windows(&token, n).count(), expected);
        }
    }
}
