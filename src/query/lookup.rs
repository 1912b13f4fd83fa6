//! Wordlist lookup modes.
//!
//! A keyword resolves to zero or more wordlist rows:
//! - exact: the row whose term equals the keyword
//! - as-you-type: prefix rows for keywords of two characters or fewer,
//!   substring rows otherwise, shortest term first
//! - fuzzy: rows sharing a short literal prefix within a bounded edit
//!   distance, tried only when the other modes found nothing
//!
//! Downstream posting resolution treats every mode alike.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::partition::PartitionKey;
use crate::store::{IndexStore, Posting, TermMatch, TermOrder, WordlistEntry};
use crate::util::levenshtein::levenshtein_distance_threshold;

/// Keywords up to this many characters use prefix matching in
/// as-you-type mode.
pub const AS_YOU_TYPE_PREFIX_CHARS: usize = 2;

/// Fuzzy matching parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Leading characters a candidate must share with the keyword.
    pub prefix_length: usize,
    /// Candidates fetched by descending hit count before distances are computed.
    pub max_expansions: usize,
    /// Largest accepted Levenshtein distance.
    pub max_distance: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        FuzzyConfig {
            prefix_length: 2,
            max_expansions: 50,
            max_distance: 2,
        }
    }
}

/// A wordlist row accepted by the fuzzy matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub entry: WordlistEntry,
    pub distance: usize,
}

/// Rows within `config.max_distance` of `keyword`, by ascending distance
/// and then descending hit count.
pub fn fuzzy_matches(
    store: &dyn IndexStore,
    partition: &PartitionKey,
    keyword: &str,
    config: &FuzzyConfig,
) -> Result<Vec<FuzzyMatch>> {
    let prefix: String = keyword.chars().take(config.prefix_length).collect();
    let candidates = store.match_terms(
        partition,
        TermMatch::Prefix(&prefix),
        TermOrder::HitsDesc,
        config.max_expansions,
    )?;

    let mut matches: Vec<FuzzyMatch> = candidates
        .into_iter()
        .filter_map(|entry| {
            levenshtein_distance_threshold(&entry.term, keyword, config.max_distance)
                .map(|distance| FuzzyMatch { entry, distance })
        })
        .collect();
    matches.sort_by(|a, b| {
        a.distance
            .cmp(&b.distance)
            .then_with(|| b.entry.num_hits.cmp(&a.entry.num_hits))
    });
    Ok(matches)
}

/// Rows for an incomplete keyword, shortest term first.
pub fn as_you_type_matches(
    store: &dyn IndexStore,
    partition: &PartitionKey,
    keyword: &str,
    width: usize,
) -> Result<Vec<WordlistEntry>> {
    let pattern = if keyword.chars().count() <= AS_YOU_TYPE_PREFIX_CHARS {
        TermMatch::Prefix(keyword)
    } else {
        TermMatch::Infix(keyword)
    };
    store.match_terms(partition, pattern, TermOrder::LengthThenHits, width)
}

/// Picks a lookup mode per keyword and turns rows into postings.
#[derive(Debug, Clone, Default)]
pub struct TermLookup {
    /// Fuzzy fallback, when enabled.
    pub fuzzy: Option<FuzzyConfig>,
    /// As-you-type width for the last keyword, when enabled.
    pub as_you_type: Option<usize>,
}

impl TermLookup {
    /// Wordlist rows for a stemmed keyword. `is_last` marks the lexically
    /// last keyword of the query, the only one eligible for as-you-type.
    pub fn wordlist(
        &self,
        store: &dyn IndexStore,
        partition: &PartitionKey,
        keyword: &str,
        is_last: bool,
    ) -> Result<Vec<WordlistEntry>> {
        let keyword = keyword.to_lowercase();
        let rows = match self.as_you_type {
            Some(width) if is_last => as_you_type_matches(store, partition, &keyword, width)?,
            _ => store.find_term(partition, &keyword)?.into_iter().collect(),
        };

        match &self.fuzzy {
            Some(config) if rows.is_empty() => Ok(fuzzy_matches(store, partition, &keyword, config)?
                .into_iter()
                .map(|m| m.entry)
                .collect()),
            _ => Ok(rows),
        }
    }

    /// Document frequency used for scoring: that of the best row.
    pub fn doc_freq(rows: &[WordlistEntry]) -> u64 {
        rows.first()
            .map_or(0, |entry| u64::try_from(entry.num_docs).unwrap_or(0))
    }

    /// Postings of the rows, capped at `limit` overall.
    ///
    /// With fuzziness every row contributes, in row order; otherwise only
    /// the best row does.
    pub fn postings(
        &self,
        store: &dyn IndexStore,
        partition: &PartitionKey,
        rows: &[WordlistEntry],
        limit: Option<usize>,
    ) -> Result<Vec<Posting>> {
        let ids: Vec<_> = if self.fuzzy.is_some() {
            rows.iter().map(|entry| entry.id).collect()
        } else {
            rows.iter().take(1).map(|entry| entry.id).collect()
        };
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        store.postings_for_terms(partition, &ids, limit)
    }
}
