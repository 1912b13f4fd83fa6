//! Char filters that normalize raw text before tokenization.
//!
//! # Available Filters
//!
//! - [`markup::MarkupStripCharFilter`] - Removes comments, script/style blocks,
//!   tags and bracketed shortcodes, optionally decoding HTML entities

pub mod markup;

pub use markup::MarkupStripCharFilter;

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}
