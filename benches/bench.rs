//! Criterion benchmarks for Halberd.
//!
//! Covers the hot paths of the engine:
//! - Tokenizing and stemming document text
//! - Batch indexing into the memory driver
//! - Ranked, boolean and fuzzy queries over a built index

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use halberd::analysis::{RegexTokenizer, StemmerRegistry, StopWords, Tokenizer};
use halberd::indexer::{BuildStatus, Document, Indexer, IndexerConfig};
use halberd::partition::PartitionKey;
use halberd::search::{SearchConfig, Searcher};
use halberd::store::{IndexConfig, StoreHandle, create_index};
use std::hint::black_box;

const WORDS: &[&str] = &[
    "search", "engine", "full", "text", "index", "query", "document", "field", "term",
    "phrase", "boolean", "ranking", "relevance", "score", "analysis", "tokenization",
    "stemming", "running", "shoes", "boots", "leather", "summer", "winter", "jacket",
    "waterproof", "lightweight", "storage", "retrieval", "filtering", "partition",
];

/// Generate pseudo-random documents for benchmarking.
fn generate_test_documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let length = 20 + (i % 60);
            let body: Vec<&str> = (0..length)
                .map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()])
                .collect();
            Document::new()
                .with_field("id", (i + 1).to_string())
                .with_field("title", WORDS[i % WORDS.len()])
                .with_field("body", body.join(" "))
        })
        .collect()
}

fn build_index(count: usize) -> StoreHandle {
    let store = create_index(&IndexConfig::new("memory")).unwrap();
    let indexer = Indexer::new(store.clone(), IndexerConfig::default()).unwrap();
    indexer
        .run(generate_test_documents(count).into_iter(), &BuildStatus::new())
        .unwrap();
    store
}

/// Benchmark tokenizing and stemming.
fn bench_text_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_analysis");

    let tokenizer = RegexTokenizer::new().unwrap();
    let stemmer = StemmerRegistry::new().create("porter").unwrap();
    let documents = generate_test_documents(100);
    let texts: Vec<String> = documents
        .iter()
        .map(|doc| doc.get("body").unwrap_or_default().to_string())
        .collect();

    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("tokenize_and_stem", |b| {
        b.iter(|| {
            for text in &texts {
                let tokens = tokenizer.tokenize(black_box(text), &StopWords::none()).unwrap();
                let stems: Vec<String> = tokens.iter().map(|token| stemmer.stem(token)).collect();
                black_box(stems);
            }
        })
    });

    group.finish();
}

/// Benchmark batch indexing.
fn bench_indexing(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexing");
    group.sample_size(10);

    for cache in [true, false] {
        group.throughput(Throughput::Elements(500));
        let name = if cache { "batch_500_cached" } else { "batch_500_uncached" };
        group.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let store = create_index(&IndexConfig::new("memory")).unwrap();
                    let config = IndexerConfig::default().with_batch_term_cache(cache);
                    (Indexer::new(store, config).unwrap(), generate_test_documents(500))
                },
                |(indexer, documents)| {
                    let report = indexer
                        .run(documents.into_iter(), &BuildStatus::new())
                        .unwrap();
                    black_box(report)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Benchmark the query paths.
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    let store = build_index(2000);
    let partition = PartitionKey::default();
    let ranked = Searcher::open(store.clone(), SearchConfig::default()).unwrap();
    let fuzzy = Searcher::open(store.clone(), SearchConfig::default().with_fuzziness(true)).unwrap();
    let typing = Searcher::open(store, SearchConfig::default().with_as_you_type(true)).unwrap();

    group.bench_function("ranked", |b| {
        b.iter(|| black_box(ranked.search(&partition, black_box("waterproof leather boots"), 20)))
    });
    group.bench_function("boolean", |b| {
        b.iter(|| {
            black_box(ranked.search_boolean(
                &partition,
                black_box("(leather | jacket) & ~summer"),
                20,
            ))
        })
    });
    group.bench_function("fuzzy", |b| {
        b.iter(|| black_box(fuzzy.search(&partition, black_box("lether jakcet"), 20)))
    });
    group.bench_function("as_you_type", |b| {
        b.iter(|| black_box(typing.search(&partition, black_box("waterproof le"), 20)))
    });

    group.finish();
}

criterion_group!(benches, bench_text_analysis, bench_indexing, bench_search);
criterion_main!(benches);
