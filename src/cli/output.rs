//! Output formatting for CLI commands.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::args::{HalberdArgs, OutputFormat};
use crate::error::Result;
use crate::store::DocId;

/// Result structure for index creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexCreationResult {
    pub driver: String,
    pub storage: String,
    pub index_name: String,
    pub stemmer: String,
}

/// Result structure for a batch indexing run.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexingResult {
    pub total: u64,
    pub indexed: u64,
    pub skipped: u64,
    pub cached_terms: usize,
    pub total_documents: i64,
    pub duration_ms: u64,
    pub docs_per_second: f64,
}

/// Result structure for document deletion.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeletionResult {
    pub id: DocId,
    pub partition: String,
    pub total_documents: i64,
}

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchOutput {
    pub query: String,
    pub mode: String,
    pub partition: String,
    pub ids: Vec<DocId>,
    /// Source files of the hits, for indexes built from a directory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    pub total_hits: usize,
    pub duration_ms: f64,
}

/// Index statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexStats {
    pub driver: Option<String>,
    pub stemmer: Option<String>,
    pub total_documents: i64,
    pub partition: String,
    pub terms: usize,
    pub postings: usize,
    pub documents: usize,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &HalberdArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_result(&mut out, message, result, args)?;
    out.flush()?;
    Ok(())
}

/// Write a result to `out` in the format selected by `args`.
pub fn write_result<T: Serialize>(
    out: &mut dyn Write,
    message: &str,
    result: &T,
    args: &HalberdArgs,
) -> Result<()> {
    let value = serde_json::to_value(result)?;
    match args.output_format {
        OutputFormat::Human => write_human(out, message, &value, args),
        OutputFormat::Json => write_json(out, &value, args),
    }
}

fn write_json(out: &mut dyn Write, value: &Value, args: &HalberdArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{json}")?;
    Ok(())
}

fn write_human(out: &mut dyn Write, message: &str, value: &Value, args: &HalberdArgs) -> Result<()> {
    if args.verbosity() > 0 {
        writeln!(out, "{message}")?;
        writeln!(out, "{}", "═".repeat(message.chars().count()))?;
    }

    match value.as_object() {
        Some(obj) => {
            for (key, field) in obj {
                writeln!(out, "{}: {}", humanize(key), render(field))?;
            }
        }
        None => writeln!(out, "{}", render(value))?,
    }
    Ok(())
}

/// `total_hits` -> `Total hits`
fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) if items.is_empty() => "(none)".to_string(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() => format!("{float:.3}"),
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn search_output() -> SearchOutput {
        SearchOutput {
            query: "red shoes".to_string(),
            mode: "ranked".to_string(),
            partition: "product/en".to_string(),
            ids: vec![4, 2],
            files: Vec::new(),
            total_hits: 7,
            duration_ms: 1.5,
        }
    }

    fn written(argv: &[&str]) -> String {
        let args = HalberdArgs::parse_from(argv);
        let mut buffer = Vec::new();
        write_result(&mut buffer, "Search Results", &search_output(), &args).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_human_output() {
        let text = written(&["halberd", "stats"]);
        assert!(text.starts_with("Search Results\n"));
        assert!(text.contains("Ids: 4, 2\n"));
        assert!(text.contains("Total hits: 7\n"));
        assert!(text.contains("Duration ms: 1.500\n"));
    }

    #[test]
    fn test_quiet_human_output_omits_header() {
        let text = written(&["halberd", "-q", "stats"]);
        assert!(!text.contains("Search Results"));
        assert!(text.contains("Query: red shoes\n"));
    }

    #[test]
    fn test_json_output() {
        let text = written(&["halberd", "--format", "json", "stats"]);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["ids"], serde_json::json!([4, 2]));
        assert_eq!(value["total_hits"], 7);
        assert_eq!(text.lines().count(), 1);

        let pretty = written(&["halberd", "--format", "json", "--pretty", "stats"]);
        assert!(pretty.lines().count() > 1);
    }

    #[test]
    fn test_render_empty_and_null() {
        assert_eq!(render(&Value::Array(Vec::new())), "(none)");
        assert_eq!(render(&Value::Null), "-");
        assert_eq!(humanize("cached_terms"), "Cached terms");
    }
}
