//! Rule-table stemmers for languages other than English.
//!
//! Each table lists inflectional suffixes for one language. Stemming removes
//! the longest listed suffix, but only while at least `min_stem_chars`
//! characters of the word remain. The tables are deliberately light: they
//! conflate common inflections without attempting full morphology.

use super::Stemmer;

const GERMAN_SUFFIXES: &[&str] = &[
    "erinnen", "ungen", "heit", "keit", "lich", "isch", "chen", "erin", "ung", "end", "ern", "em",
    "en", "er", "es", "e", "s",
];

const FRENCH_SUFFIXES: &[&str] = &[
    "issements", "issement", "atrices", "atrice", "ateurs", "ations", "ateur", "ation", "ements",
    "ement", "euses", "euse", "ités", "ité", "ives", "ive", "ifs", "if", "eux", "aux", "es", "er",
    "ez", "e", "s", "x",
];

const ITALIAN_SUFFIXES: &[&str] = &[
    "azione", "azioni", "amento", "amenti", "imento", "imenti", "mente", "atore", "atori", "ista",
    "iste", "isti", "ità", "oso", "osa", "osi", "ose", "are", "ere", "ire", "i", "e", "a", "o",
];

const CROATIAN_SUFFIXES: &[&str] = &[
    "ovima", "evima", "ijama", "ima", "ama", "ova", "eva", "ski", "ska", "sko", "om", "em", "og",
    "oj", "ih", "im", "a", "e", "i", "o", "u",
];

/// A longest-suffix stemmer driven by a static rule table.
#[derive(Debug, Clone)]
pub struct RuleTableStemmer {
    name: &'static str,
    suffixes: Vec<&'static str>,
    min_stem_chars: usize,
}

impl RuleTableStemmer {
    /// Build a stemmer from a suffix table. Suffixes are tried longest first.
    pub fn new(name: &'static str, suffixes: &[&'static str], min_stem_chars: usize) -> Self {
        let mut suffixes = suffixes.to_vec();
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
        RuleTableStemmer {
            name,
            suffixes,
            min_stem_chars,
        }
    }

    pub fn german() -> Self {
        Self::new("german", GERMAN_SUFFIXES, 3)
    }

    pub fn french() -> Self {
        Self::new("french", FRENCH_SUFFIXES, 3)
    }

    pub fn italian() -> Self {
        Self::new("italian", ITALIAN_SUFFIXES, 3)
    }

    pub fn croatian() -> Self {
        Self::new("croatian", CROATIAN_SUFFIXES, 2)
    }
}

impl Stemmer for RuleTableStemmer {
    fn stem(&self, word: &str) -> String {
        let word = word.to_lowercase();
        let length = word.chars().count();

        for suffix in &self.suffixes {
            if let Some(stem) = word.strip_suffix(suffix) {
                if length - suffix.chars().count() >= self.min_stem_chars {
                    return stem.to_string();
                }
            }
        }
        word
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_german() {
        let stemmer = RuleTableStemmer::german();
        assert_eq!(stemmer.stem("Häuser"), "häus");
        assert_eq!(stemmer.stem("Zeitungen"), "zeit");
        assert_eq!(stemmer.stem("Freiheit"), "frei");
        assert_eq!(stemmer.stem("Tee"), "tee");
    }

    #[test]
    fn test_french() {
        let stemmer = RuleTableStemmer::french();
        assert_eq!(stemmer.stem("chaussures"), "chaussur");
        assert_eq!(stemmer.stem("rapidement"), "rapid");
        assert_eq!(stemmer.stem("qualité"), "qual");
    }

    #[test]
    fn test_italian() {
        let stemmer = RuleTableStemmer::italian();
        assert_eq!(stemmer.stem("scarpe"), "scarp");
        assert_eq!(stemmer.stem("velocemente"), "veloce");
    }

    #[test]
    fn test_croatian() {
        let stemmer = RuleTableStemmer::croatian();
        assert_eq!(stemmer.stem("knjigama"), "knjig");
        assert_eq!(stemmer.stem("grad"), "grad");
    }

    #[test]
    fn test_min_stem_length_guards_short_words() {
        let stemmer = RuleTableStemmer::new("test", &["ing"], 3);
        assert_eq!(stemmer.stem("sing"), "sing");
        assert_eq!(stemmer.stem("singing"), "sing");
    }
}
