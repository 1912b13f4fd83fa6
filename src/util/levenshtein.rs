//! Edit distance used by fuzzy term expansion.
//!
//! Distances are counted in Unicode scalar values, so `"café"` and `"cafe"`
//! are one edit apart.

use std::cmp::min;

/// Levenshtein distance between two strings: the minimum number of single
/// character insertions, deletions or substitutions turning `a` into `b`.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = min(min(prev[j + 1] + 1, curr[j] + 1), substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Bounded Levenshtein distance.
///
/// Returns `None` as soon as the distance is known to exceed `threshold`,
/// which lets candidate filtering skip most of the matrix for distant words.
pub fn levenshtein_distance_threshold(a: &str, b: &str, threshold: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.len().abs_diff(b.len()) > threshold {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        let distance = a.len().max(b.len());
        return (distance <= threshold).then_some(distance);
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = min(min(prev[j + 1] + 1, curr[j] + 1), substitution);
            row_min = min(row_min, curr[j + 1]);
        }
        if row_min > threshold {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= threshold).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("helo", "hello"), 1);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein_distance("café", "cafe"), 1);
        assert_eq!(levenshtein_distance("straße", "strasse"), 2);
    }

    #[test]
    fn test_levenshtein_threshold() {
        assert_eq!(levenshtein_distance_threshold("helo", "hello", 2), Some(1));
        assert_eq!(levenshtein_distance_threshold("helo", "help", 2), Some(1));
        assert_eq!(levenshtein_distance_threshold("kitten", "sitting", 2), None);
        assert_eq!(levenshtein_distance_threshold("a", "abcd", 2), None);
        assert_eq!(levenshtein_distance_threshold("", "ab", 2), Some(2));
    }

    #[test]
    fn test_threshold_agrees_with_full_distance() {
        let words = ["search", "serch", "searching", "research", "starch", "sea"];
        for a in words {
            for b in words {
                let full = levenshtein_distance(a, b);
                let bounded = levenshtein_distance_threshold(a, b, 3);
                assert_eq!(bounded, (full <= 3).then_some(full), "{a} vs {b}");
            }
        }
    }
}
