//! Partition keys and logical table naming.
//!
//! Every `(post type, language)` pair owns an independent wordlist/doclist
//! pair; term ids are not comparable across partitions. The info table is
//! shared. A key is passed explicitly into every indexing and query call.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{HalberdError, Result};

/// Post type that contributes no table suffix.
pub const DEFAULT_POST_TYPE: &str = "product";

static LANG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}$").expect("lang pattern"));
static POST_TYPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_\-]{1,50}$").expect("post type pattern"));
/// Post types that would read as a language suffix once joined with `_`.
static LANG_LIKE_POST_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|_)[a-z]{2}$").expect("lang-like post type pattern"));

/// The logical tables of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Wordlist,
    Doclist,
    Info,
    Filemap,
}

impl Table {
    pub fn base_name(&self) -> &'static str {
        match self {
            Table::Wordlist => "wordlist",
            Table::Doclist => "doclist",
            Table::Info => "info",
            Table::Filemap => "filemap",
        }
    }
}

/// Identifies one partition of the index.
///
/// # Examples
///
/// ```
/// use halberd::partition::PartitionKey;
///
/// assert_eq!(PartitionKey::default().suffix(), "");
/// assert_eq!(PartitionKey::new("product", "en").unwrap().suffix(), "_en");
/// assert_eq!(PartitionKey::new("post", "fr").unwrap().suffix(), "_post_fr");
/// assert!(PartitionKey::new("post", "french").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    post_type: Option<String>,
    lang: Option<String>,
}

impl PartitionKey {
    /// Build a key from raw routing values. Empty strings mean "unset".
    pub fn new(post_type: &str, lang: &str) -> Result<Self> {
        PartitionKey::default()
            .with_post_type(post_type)?
            .with_lang(lang)
    }

    /// Set the post type. The default post type and the empty string clear it.
    ///
    /// A post type that is two letters, or ends in `_` and two letters, is
    /// rejected: `("post_en", "")` and `("post", "en")` would otherwise share
    /// physical table names.
    pub fn with_post_type(mut self, post_type: &str) -> Result<Self> {
        let post_type = post_type.trim();
        if post_type.is_empty() || post_type == DEFAULT_POST_TYPE {
            self.post_type = None;
            return Ok(self);
        }
        if !POST_TYPE_PATTERN.is_match(post_type) {
            return Err(HalberdError::invalid_argument(format!(
                "Invalid post type [{post_type}]"
            )));
        }
        if LANG_LIKE_POST_TYPE.is_match(post_type) {
            return Err(HalberdError::invalid_argument(format!(
                "Invalid post type [{post_type}]: it ends like a language suffix"
            )));
        }
        self.post_type = Some(post_type.to_string());
        Ok(self)
    }

    /// Set the language. The empty string clears it.
    pub fn with_lang(mut self, lang: &str) -> Result<Self> {
        let lang = lang.trim();
        if lang.is_empty() {
            self.lang = None;
            return Ok(self);
        }
        if !LANG_PATTERN.is_match(lang) {
            return Err(HalberdError::invalid_argument(format!(
                "Invalid language [{lang}]"
            )));
        }
        self.lang = Some(lang.to_string());
        Ok(self)
    }

    /// The post type, or [`DEFAULT_POST_TYPE`].
    pub fn post_type(&self) -> &str {
        self.post_type.as_deref().unwrap_or(DEFAULT_POST_TYPE)
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub fn is_default(&self) -> bool {
        self.post_type.is_none() && self.lang.is_none()
    }

    /// `_<postType>` when not the default, then `_<lang>` when set.
    pub fn suffix(&self) -> String {
        let mut suffix = String::new();
        if let Some(post_type) = &self.post_type {
            suffix.push('_');
            suffix.push_str(post_type);
        }
        if let Some(lang) = &self.lang {
            suffix.push('_');
            suffix.push_str(lang);
        }
        suffix
    }

    /// Physical name of a logical table. The shared info and filemap tables
    /// are never suffixed.
    pub fn table_name(&self, prefix: &str, table: Table) -> String {
        match table {
            Table::Info | Table::Filemap => format!("{prefix}{}", table.base_name()),
            _ => format!("{prefix}{}{}", table.base_name(), self.suffix()),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.post_type(), self.lang().unwrap_or("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_partition_has_no_suffix() {
        let key = PartitionKey::new("", "").unwrap();
        assert!(key.is_default());
        assert_eq!(key.suffix(), "");
        assert_eq!(key.post_type(), "product");
        assert_eq!(key, PartitionKey::new("product", "").unwrap());
    }

    #[test]
    fn test_table_names() {
        let key = PartitionKey::new("post", "en").unwrap();
        assert_eq!(key.table_name("", Table::Wordlist), "wordlist_post_en");
        assert_eq!(key.table_name("shop_", Table::Doclist), "shop_doclist_post_en");
        assert_eq!(key.table_name("shop_", Table::Info), "shop_info");
        assert_eq!(key.table_name("shop_", Table::Filemap), "shop_filemap");
    }

    #[test]
    fn test_validation() {
        assert!(PartitionKey::new("post", "EN").is_err());
        assert!(PartitionKey::new("post; drop table", "en").is_err());
        assert!(PartitionKey::new("landing-page", "de").is_ok());
        assert!(PartitionKey::new(&"x".repeat(51), "").is_err());
    }

    #[test]
    fn test_lang_like_post_types_are_rejected() {
        assert!(PartitionKey::new("post_en", "").is_err());
        assert!(PartitionKey::new("en", "").is_err());
        assert!(PartitionKey::new("blog_post_fr", "de").is_err());
        assert!(PartitionKey::new("post_eng", "").is_ok());
        assert!(PartitionKey::new("post-en", "").is_ok());
    }

    #[test]
    fn test_suffixes_are_distinct() {
        let keys = [
            PartitionKey::default(),
            PartitionKey::new("", "en").unwrap(),
            PartitionKey::new("post", "").unwrap(),
            PartitionKey::new("post", "en").unwrap(),
            PartitionKey::new("post_eng", "").unwrap(),
            PartitionKey::new("post_eng", "en").unwrap(),
            PartitionKey::new("page", "en").unwrap(),
        ];
        let suffixes: std::collections::BTreeSet<String> =
            keys.iter().map(PartitionKey::suffix).collect();
        assert_eq!(suffixes.len(), keys.len());
    }

    #[test]
    fn test_display() {
        assert_eq!(PartitionKey::default().to_string(), "product/-");
        assert_eq!(PartitionKey::new("post", "fr").unwrap().to_string(), "post/fr");
    }
}
