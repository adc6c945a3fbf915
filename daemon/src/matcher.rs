//! Word matching: case-insensitive substring containment.
//!
//! Deliberately substring, not whole-word — "vip" matches inside "vips".

/// Returns true when `word` occurs anywhere in `text`, ignoring case.
/// An empty word never matches.
pub fn matches(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    text.to_lowercase().contains(&word.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_any_case_combination() {
        assert!(matches("Welcome vip guest", "VIP"));
        assert!(matches("Welcome VIP guest", "vip"));
        assert!(matches("Welcome ViP guest", "vIp"));
    }

    #[test]
    fn no_match_when_word_absent() {
        assert!(!matches("Welcome guest", "VIP"));
        assert!(!matches("", "VIP"));
    }

    #[test]
    fn matches_inside_longer_words() {
        // Substring semantics, no word boundaries.
        assert!(matches("all vips welcome", "vip"));
        assert!(matches("guestlist", "list"));
    }

    #[test]
    fn empty_word_never_matches() {
        assert!(!matches("Welcome vip guest", ""));
        assert!(!matches("", ""));
    }

    #[test]
    fn matches_non_ascii_case_folds() {
        assert!(matches("Entrada GRATUITA mañana", "gratuita"));
        assert!(matches("willkommen GÄSTE", "gäste"));
    }
}
