//! Command implementations for the halberd CLI.

use std::time::Instant;

use tracing::info;

use crate::analysis::StopWords;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::Result;
use crate::indexer::{
    BatchReport, BuildStatus, DirectorySource, Indexer, IndexerConfig, JsonLinesSource,
    TextFileReader,
};
use crate::search::Searcher;
use crate::store::{InfoKey, create_index};

/// Execute a CLI command.
pub fn execute_command(args: HalberdArgs) -> Result<()> {
    match &args.command {
        Command::CreateIndex(create_args) => run_create_index(create_args, &args),
        Command::Index(index_args) => run_index(index_args, &args),
        Command::Delete(delete_args) => run_delete(delete_args, &args),
        Command::Search(search_args) => run_search(search_args, false, &args),
        Command::SearchBoolean(search_args) => run_search(search_args, true, &args),
        Command::Stats(stats_args) => run_stats(stats_args, &args),
    }
}

fn run_create_index(args: &CreateIndexArgs, cli_args: &HalberdArgs) -> Result<()> {
    let mut config = args.location.to_config()?;
    if let Some(stemmer) = &args.stemmer {
        config.stemmer = Some(stemmer.clone());
    }

    let handle = create_index(&config)?;
    let store = handle.lock();
    let result = IndexCreationResult {
        driver: store.driver().to_string(),
        storage: config.storage.display().to_string(),
        index_name: config.index_name.clone(),
        stemmer: store.info(InfoKey::Stemmer)?.unwrap_or_default(),
    };
    drop(store);

    output_result("Index created", &result, cli_args)
}

fn run_index(args: &IndexArgs, cli_args: &HalberdArgs) -> Result<()> {
    let handle = create_index(&args.location.to_config()?)?;

    let mut config = IndexerConfig::default()
        .with_primary_key(&args.primary_key)
        .with_decode_entities(args.decode_entities)
        .with_batch_term_cache(!args.no_term_cache)
        .with_progress_interval(args.progress_interval)
        .with_multilingual(args.multilingual);
    if args.include_primary_key {
        config = config.include_primary_key();
    }
    if args.english_stop_words {
        config = config.with_stop_words(StopWords::english());
    }

    let indexer = Indexer::new(handle, config)?;
    let status = BuildStatus::with_processed(args.resume_from);
    let started = Instant::now();

    let report = match (&args.jsonl, &args.dir) {
        (Some(path), _) => {
            info!(target: "halberd::cli", path = %path.display(), "indexing JSON lines");
            indexer.run(JsonLinesSource::open(path)?, &status)?
        }
        (None, Some(dir)) => {
            info!(target: "halberd::cli", dir = %dir.display(), "indexing directory");
            let extensions: Vec<&str> = args.extensions.iter().map(String::as_str).collect();
            indexer.run(
                DirectorySource::with_reader(dir, TextFileReader, &extensions)?,
                &status,
            )?
        }
        (None, None) => BatchReport::default(),
    };

    let duration = started.elapsed();
    let seconds = duration.as_secs_f64();
    let result = IndexingResult {
        total: report.total,
        indexed: report.indexed,
        skipped: report.skipped,
        cached_terms: report.cached_terms,
        total_documents: indexer.total_documents()?,
        duration_ms: duration.as_millis() as u64,
        docs_per_second: if seconds > 0.0 {
            report.indexed as f64 / seconds
        } else {
            0.0
        },
    };

    output_result("Indexing complete", &result, cli_args)
}

fn run_delete(args: &DeleteArgs, cli_args: &HalberdArgs) -> Result<()> {
    let partition = args.partition.to_key()?;
    let handle = create_index(&args.location.to_config()?)?;
    let indexer = Indexer::new(handle, IndexerConfig::default())?;

    indexer.delete(args.id, &partition)?;

    let result = DeletionResult {
        id: args.id,
        partition: partition.to_string(),
        total_documents: indexer.total_documents()?,
    };
    output_result("Document deleted", &result, cli_args)
}

fn run_search(args: &SearchArgs, boolean: bool, cli_args: &HalberdArgs) -> Result<()> {
    let result = search(args, boolean)?;
    output_result("Search Results", &result, cli_args)
}

fn search(args: &SearchArgs, boolean: bool) -> Result<SearchOutput> {
    let partition = args.partition.to_key()?;
    let handle = create_index(&args.location.to_config()?)?;
    let searcher = Searcher::open(handle, args.to_config())?;

    let results = if boolean {
        searcher.search_boolean(&partition, &args.query, args.limit)?
    } else {
        searcher.search(&partition, &args.query, args.limit)?
    };
    let files = searcher
        .file_paths(&results.ids)?
        .into_iter()
        .map(|(_, path)| path)
        .collect();

    Ok(SearchOutput {
        query: args.query.clone(),
        mode: if boolean { "boolean" } else { "ranked" }.to_string(),
        partition: partition.to_string(),
        total_hits: results.total_hits,
        duration_ms: results.elapsed.as_secs_f64() * 1000.0,
        ids: results.ids,
        files,
    })
}

fn run_stats(args: &StatsArgs, cli_args: &HalberdArgs) -> Result<()> {
    let partition = args.partition.to_key()?;
    let handle = create_index(&args.location.to_config()?)?;
    let store = handle.lock();

    let stats = store.partition_stats(&partition)?;
    let result = IndexStats {
        driver: store.info(InfoKey::Driver)?,
        stemmer: store.info(InfoKey::Stemmer)?,
        total_documents: crate::indexer::read_total_documents(&*store)?,
        partition: partition.to_string(),
        terms: stats.terms,
        postings: stats.postings,
        documents: stats.documents,
    };
    drop(store);

    output_result("Index Statistics", &result, cli_args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn run(argv: &[&str]) {
        execute_command(HalberdArgs::parse_from(argv)).unwrap();
    }

    #[test]
    fn test_index_then_search_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let storage = temp_dir.path().join("index");
        let storage = storage.to_str().unwrap();
        let rows = temp_dir.path().join("rows.jsonl");
        std::fs::write(
            &rows,
            "{\"id\": 1, \"title\": \"red shoes\"}\n{\"id\": 2, \"title\": \"blue hat\"}\n",
        )
        .unwrap();

        run(&["halberd", "-q", "create-index", "-d", "filesystem", "-s", storage]);
        run(&[
            "halberd", "-q", "index", "-d", "filesystem", "-s", storage, "--jsonl",
            rows.to_str().unwrap(),
        ]);
        run(&["halberd", "-q", "search", "-d", "filesystem", "-s", storage, "shoes"]);
        run(&["halberd", "-q", "search-boolean", "-d", "filesystem", "-s", storage, "red & ~hat"]);
        run(&["halberd", "-q", "delete", "-d", "filesystem", "-s", storage, "2"]);
        run(&["halberd", "-q", "stats", "-d", "filesystem", "-s", storage]);

        let handle = create_index(
            &crate::store::IndexConfig::new("filesystem").with_storage(storage),
        )
        .unwrap();
        let searcher = Searcher::open(handle, crate::search::SearchConfig::default()).unwrap();
        let partition = crate::partition::PartitionKey::default();
        assert!(searcher.search(&partition, "hat", 10).unwrap().is_empty());
        let results = searcher.search(&partition, "shoes", 10).unwrap();
        assert_eq!(results.ids, vec![1]);
    }

    #[test]
    fn test_directory_index_reports_files() {
        let temp_dir = TempDir::new().unwrap();
        let storage = temp_dir.path().join("index");
        let storage = storage.to_str().unwrap();
        let docs = temp_dir.path().join("docs");
        std::fs::create_dir(&docs).unwrap();
        std::fs::write(docs.join("kettle.txt"), "a copper kettle").unwrap();
        std::fs::write(docs.join("teapot.txt"), "a porcelain teapot").unwrap();

        run(&["halberd", "-q", "create-index", "-d", "filesystem", "-s", storage]);
        run(&[
            "halberd", "-q", "index", "-d", "filesystem", "-s", storage, "--dir",
            docs.to_str().unwrap(),
        ]);

        let args = HalberdArgs::parse_from([
            "halberd", "search", "-d", "filesystem", "-s", storage, "teapot",
        ]);
        let Command::Search(search_args) = &args.command else {
            panic!("expected a search command");
        };
        let output = search(search_args, false).unwrap();
        assert_eq!(output.ids, vec![2]);
        assert_eq!(output.files.len(), 1);
        assert!(output.files[0].ends_with("teapot.txt"));
    }

    #[test]
    fn test_missing_driver_fails() {
        if std::env::var_os("HALBERD_DRIVER").is_some() {
            return;
        }
        let err = execute_command(HalberdArgs::parse_from(["halberd", "-q", "stats"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: A driver must be specified."
        );
    }

    #[test]
    fn test_invalid_partition_is_rejected() {
        let args =
            HalberdArgs::parse_from(["halberd", "-q", "stats", "-d", "memory", "--lang", "eng"]);
        assert!(execute_command(args).is_err());
    }
}
