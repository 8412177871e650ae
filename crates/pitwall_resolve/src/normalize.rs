//! Free-text identifier normalization.
//!
//! Every literal comparison in the resolvers runs on normalized text on both
//! sides, so matching is exact-after-normalize and never fuzzy.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize an identifier for literal matching.
///
/// Decomposes (NFD), strips combining marks, turns `_` and `-` into spaces,
/// drops punctuation other than apostrophes, collapses whitespace, trims and
/// lowercases. Idempotent.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            '_' | '-' => ' ',
            '\u{2018}' | '\u{2019}' | '\u{02BC}' => '\'',
            other => other,
        })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '\'')
        .collect();

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_diacritics_and_case() {
        assert_eq!(normalize("Sergio Pérez"), "sergio perez");
        assert_eq!(normalize("Kimi RÄIKKÖNEN"), "kimi raikkonen");
        assert_eq!(normalize("Nico Hülkenberg"), "nico hulkenberg");
    }

    #[test]
    fn test_separators_become_spaces() {
        assert_eq!(normalize("max_verstappen"), "max verstappen");
        assert_eq!(normalize("Spa-Francorchamps"), "spa francorchamps");
    }

    #[test]
    fn test_punctuation_stripped_except_apostrophe() {
        assert_eq!(normalize("Circuit de Spa-Francorchamps!"), "circuit de spa francorchamps");
        assert_eq!(normalize("O'Ward."), "o'ward");
        assert_eq!(normalize("O\u{2019}Ward"), "o'ward");
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        assert_eq!(normalize("  MAX   VERSTAPPEN \t"), "max verstappen");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("..."), "");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(s in "[ -\u{024F}]{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_has_no_outer_or_double_spaces(s in "[a-zA-Zéüö _\\-'.,]{0,40}") {
            let out = normalize(&s);
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
            prop_assert!(!out.contains("  "));
        }
    }
}
