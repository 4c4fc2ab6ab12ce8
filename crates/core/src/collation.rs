//! Russian alphabetical ordering and search folding.
//!
//! Unicode code point order almost matches the Russian alphabet, except that
//! `ё` sits after `я`. Lists shown to users (cities, filter options) must put
//! it right after `е`, and searches should treat `е` and `ё` as the same
//! letter since most people type `е`.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Separator,
    Digit,
    Latin,
    Cyrillic,
    Other,
}

fn collation_weight(c: char) -> (CharClass, u32) {
    let lower = c.to_lowercase().next().unwrap_or(c);
    match lower {
        'ё' => (CharClass::Cyrillic, ('е' as u32 - 'а' as u32) * 2 + 1),
        'а'..='я' => (CharClass::Cyrillic, (lower as u32 - 'а' as u32) * 2),
        'a'..='z' => (CharClass::Latin, lower as u32),
        '0'..='9' => (CharClass::Digit, lower as u32),
        c if c.is_whitespace() || c.is_ascii_punctuation() => (CharClass::Separator, c as u32),
        c => (CharClass::Other, c as u32),
    }
}

/// Compare two strings in Russian alphabetical order, case-insensitively.
///
/// Strings equal under that order fall back to code point comparison so the
/// result is total and deterministic.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(collation_weight)
        .cmp(b.chars().map(collation_weight))
        .then_with(|| a.cmp(b))
}

/// Lowercase and fold `ё` into `е` for matching user queries.
#[must_use]
pub fn fold(s: &str) -> String {
    s.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ё' { 'е' } else { c })
        .collect()
}

/// Whether `haystack` contains `needle` after folding both.
#[must_use]
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yo_sorts_after_ye() {
        let mut cities = vec!["Якутск", "Ёкатерининск", "Елец", "Жуковский", "Абакан"];
        cities.sort_by(|a, b| compare(a, b));
        assert_eq!(cities, ["Абакан", "Елец", "Ёкатерининск", "Жуковский", "Якутск"]);
    }

    #[test]
    fn test_compare_is_case_insensitive() {
        assert_eq!(compare("москва", "Мурманск"), Ordering::Less);
        assert_eq!(compare("Москва", "москва"), "Москва".cmp("москва"));
    }

    #[test]
    fn test_latin_and_digits_before_cyrillic() {
        let mut names = vec!["Омск", "Zelenograd", "1-й Поселок"];
        names.sort_by(|a, b| compare(a, b));
        assert_eq!(names, ["1-й Поселок", "Zelenograd", "Омск"]);
    }

    #[test]
    fn test_fold_matching() {
        assert_eq!(fold("  Орёл "), "орел");
        assert!(contains_folded("Москва", "моск"));
        assert!(contains_folded("Королёв", "КОРОЛЕВ"));
        assert!(!contains_folded("Казань", "моск"));
    }
}
