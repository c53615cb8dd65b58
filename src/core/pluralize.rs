//! Pluralization of resource names
//!
//! Collection names and URL segments are derived from the singular resource
//! name. Compound names (`raw_material`, `loan-account`) only inflect their
//! last word.

/// Words whose plural is not produced by the suffix rules
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("staff", "staff"),
    ("equipment", "equipment"),
    ("photo", "photos"),
    ("piano", "pianos"),
    ("memo", "memos"),
];

/// Utility for converting singular resource names to plural form
pub struct Pluralizer;

impl Pluralizer {
    /// Convert a singular (possibly compound) noun to its plural form
    ///
    /// # Examples
    ///
    /// ```
    /// use pocketbooks::core::pluralize::Pluralizer;
    ///
    /// assert_eq!(Pluralizer::pluralize("client"), "clients");
    /// assert_eq!(Pluralizer::pluralize("raw_material"), "raw_materials");
    /// assert_eq!(Pluralizer::pluralize("inventory"), "inventories");
    /// assert_eq!(Pluralizer::pluralize("expense"), "expenses");
    /// ```
    pub fn pluralize(singular: &str) -> String {
        match singular.rfind(['_', '-']) {
            Some(idx) => {
                let (head, last) = singular.split_at(idx + 1);
                format!("{}{}", head, Self::pluralize_word(last))
            }
            None => Self::pluralize_word(singular),
        }
    }

    fn pluralize_word(word: &str) -> String {
        if word.is_empty() {
            return String::new();
        }

        if let Some((_, plural)) = IRREGULAR.iter().find(|(s, _)| *s == word) {
            return plural.to_string();
        }

        match word {
            // consonant + y -> ies
            s if s.len() > 1 && s.ends_with('y') && !ends_with_vowel_before(s, 'y') => {
                format!("{}ies", &s[..s.len() - 1])
            }

            // s, sh, ch, x, z -> es
            s if s.ends_with('s')
                || s.ends_with("sh")
                || s.ends_with("ch")
                || s.ends_with('x')
                || s.ends_with('z') =>
            {
                format!("{}es", s)
            }

            // fe -> ves
            s if s.len() > 2 && s.ends_with("fe") => format!("{}ves", &s[..s.len() - 2]),

            // consonant + o -> oes
            s if s.len() > 1 && s.ends_with('o') && !ends_with_vowel_before(s, 'o') => {
                format!("{}es", s)
            }

            s => format!("{}s", s),
        }
    }
}

/// Whether the character right before the final `last` is a vowel
fn ends_with_vowel_before(word: &str, last: char) -> bool {
    let mut chars = word.chars().rev();
    debug_assert_eq!(chars.next(), Some(last));
    matches!(chars.next(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}
