//! Stemming algorithms and the discriminator registry.
//!
//! The stemmer an index was built with is recorded by name in the index's
//! info record. A search session reads that name back and asks the
//! [`StemmerRegistry`] for a fresh instance, so queries are always stemmed the
//! same way as the documents were.

pub mod no_stem;
pub mod porter;
pub mod rule_table;

pub use no_stem::NoStemmer;
pub use porter::PorterStemmer;
pub use rule_table::RuleTableStemmer;

use ahash::AHashMap;

use crate::error::{HalberdError, Result};

/// Discriminator of the default stemmer.
pub const DEFAULT_STEMMER: &str = "porter";

/// Trait for stemming algorithms.
pub trait Stemmer: Send + Sync {
    /// Stem a word to its root form.
    fn stem(&self, word: &str) -> String;

    /// The discriminator persisted for this stemmer.
    fn name(&self) -> &'static str;
}

type StemmerConstructor = fn() -> Box<dyn Stemmer>;

/// Maps persisted stemmer discriminators to constructors.
///
/// Discriminators are matched case-insensitively. Legacy names, including
/// namespaced class-style names such as `Vendor\Stemmer\PorterStemmer`, are
/// resolved through an alias table to their current discriminator.
///
/// # Examples
///
/// ```
/// use halberd::analysis::stemmer::StemmerRegistry;
///
/// let registry = StemmerRegistry::new();
/// let stemmer = registry.create("Search\\Stemmer\\PorterStemmer").unwrap();
/// assert_eq!(stemmer.name(), "porter");
/// assert_eq!(stemmer.stem("running"), "run");
/// ```
#[derive(Clone)]
pub struct StemmerRegistry {
    constructors: AHashMap<&'static str, StemmerConstructor>,
    aliases: AHashMap<String, &'static str>,
}

impl std::fmt::Debug for StemmerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("StemmerRegistry")
            .field("stemmers", &names)
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

impl Default for StemmerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StemmerRegistry {
    /// Create a registry holding every built-in stemmer and legacy alias.
    pub fn new() -> Self {
        let mut registry = StemmerRegistry {
            constructors: AHashMap::new(),
            aliases: AHashMap::new(),
        };

        registry.register("porter", || Box::new(PorterStemmer::new()));
        registry.register("no", || Box::new(NoStemmer::new()));
        registry.register("german", || Box::new(RuleTableStemmer::german()));
        registry.register("french", || Box::new(RuleTableStemmer::french()));
        registry.register("italian", || Box::new(RuleTableStemmer::italian()));
        registry.register("croatian", || Box::new(RuleTableStemmer::croatian()));

        for (alias, target) in [
            ("porterstemmer", "porter"),
            ("english", "porter"),
            ("en", "porter"),
            ("nostemmer", "no"),
            ("identity", "no"),
            ("none", "no"),
            ("germanstemmer", "german"),
            ("de", "german"),
            ("frenchstemmer", "french"),
            ("fr", "french"),
            ("italianstemmer", "italian"),
            ("it", "italian"),
            ("croatianstemmer", "croatian"),
            ("hr", "croatian"),
        ] {
            registry.alias(alias, target);
        }

        registry
    }

    /// Register a constructor under a discriminator.
    pub fn register(&mut self, discriminator: &'static str, constructor: StemmerConstructor) {
        self.constructors.insert(discriminator, constructor);
    }

    /// Register a legacy name for an existing discriminator.
    pub fn alias<S: AsRef<str>>(&mut self, alias: S, target: &'static str) {
        self.aliases.insert(alias.as_ref().to_lowercase(), target);
    }

    /// Resolve a stored discriminator (or alias) to its current discriminator.
    pub fn resolve(&self, discriminator: &str) -> Option<&'static str> {
        let trimmed = discriminator.trim();
        let short = trimmed.rsplit('\\').next().unwrap_or(trimmed);
        let key = short.to_lowercase();

        if let Some((name, _)) = self.constructors.get_key_value(key.as_str()) {
            return Some(*name);
        }
        self.aliases.get(&key).copied()
    }

    /// Instantiate the stemmer behind a stored discriminator.
    pub fn create(&self, discriminator: &str) -> Result<Box<dyn Stemmer>> {
        let name = self.resolve(discriminator).ok_or_else(|| {
            HalberdError::config(format!("Unknown stemmer [{discriminator}]"))
        })?;
        let constructor = self.constructors[name];
        Ok(constructor())
    }

    /// All registered discriminators, sorted.
    pub fn discriminators(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.constructors.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
