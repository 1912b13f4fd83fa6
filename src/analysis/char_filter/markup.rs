//! Markup stripping char filter.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::CharFilter;

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern"));
static SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("script pattern"));
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").expect("style pattern"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)</?[a-zA-Z!][^>]*>").expect("tag pattern"));
static SHORTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[/?[a-zA-Z_][\w\-]*(\s[^\]]*)?\]").expect("shortcode pattern"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Removes markup from document text.
///
/// Comments and `<script>`/`<style>` blocks are removed with their content;
/// other tags and `[shortcode]` markers are replaced by a space so adjacent
/// words do not merge. Runs of whitespace are collapsed.
#[derive(Clone, Debug, Default)]
pub struct MarkupStripCharFilter {
    decode_entities: bool,
}

impl MarkupStripCharFilter {
    pub fn new() -> Self {
        MarkupStripCharFilter::default()
    }

    /// Also decode HTML entities (`&amp;`, `&#233;`, ...).
    pub fn with_entity_decoding(mut self, decode: bool) -> Self {
        self.decode_entities = decode;
        self
    }

    pub fn decodes_entities(&self) -> bool {
        self.decode_entities
    }
}

fn decode_entity(caps: &Captures<'_>) -> String {
    let body = &caps[1];
    let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = body.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        match body {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => None,
        }
    };
    decoded.map_or_else(|| caps[0].to_string(), String::from)
}

impl CharFilter for MarkupStripCharFilter {
    fn filter(&self, input: &str) -> String {
        let text = COMMENT.replace_all(input, " ");
        let text = SCRIPT.replace_all(&text, " ");
        let text = STYLE.replace_all(&text, " ");
        let text = TAG.replace_all(&text, " ");
        let mut text = SHORTCODE.replace_all(&text, " ").into_owned();
        if self.decode_entities {
            text = ENTITY.replace_all(&text, decode_entity).into_owned();
        }
        WHITESPACE.replace_all(&text, " ").trim().to_string()
    }

    fn name(&self) -> &'static str {
        "markup_strip"
    }
}
