use std::fmt::Display;

/// English stop words dropped by the analyzer when stop-word filtering is on.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "all", "am", "an", "and", "any", "are", "as", "at", "be", "been", "being", "but",
    "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he", "her",
    "his", "how", "i", "if", "in", "into", "is", "it", "its", "me", "my", "of", "on", "or", "our",
    "she", "so", "such", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "to", "was", "we", "were", "what", "when", "where", "which", "who", "will", "with", "would",
    "you", "your",
];

/// Lower-cases `text`, turns everything outside `[a-z0-9]` into a separator,
/// collapses separator runs into a single space and trims both ends.
///
/// The output only ever contains ASCII lowercase letters, digits and single
/// interior spaces, so applying it twice is the same as applying it once.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Normalizes any displayable value through its textual form.
pub fn normalize_display<T: Display + ?Sized>(value: &T) -> String {
    normalize(&value.to_string())
}

pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.binary_search(&term).is_ok()
}

/// Splits already-normalized text into terms.
pub fn tokenize(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(' ').filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(normalize("How do I register?"), "how do i register");
        assert_eq!(normalize("  Don't   STOP\tme\n"), "don t stop me");
        assert_eq!(normalize("NHIF->SHA (2024)"), "nhif sha 2024");
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        assert_eq!(normalize("café au lait"), "caf au lait");
        assert_eq!(normalize("日本語"), "");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t "), "");
        assert_eq!(normalize("?!"), "");
    }

    #[test]
    fn coerces_non_text_values() {
        assert_eq!(normalize_display(&42), "42");
        assert_eq!(normalize_display(&3.5), "3 5");
        assert_eq!(normalize_display(&true), "true");
    }

    #[test]
    fn stop_word_list_is_sorted_for_lookup() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("register"));
    }

    #[test]
    fn tokenize_splits_on_spaces() {
        let terms: Vec<_> = tokenize("what are the benefits").collect();
        assert_eq!(terms, vec!["what", "are", "the", "benefits"]);
        assert_eq!(tokenize("").count(), 0);
    }
}
