//! The document counter only goes down when a delete prunes a term, so it
//! drifts above the real document count. These tests pin that behavior.

use halberd::indexer::{Document, Indexer, IndexerConfig};
use halberd::partition::PartitionKey;
use halberd::store::{IndexConfig, create_index};

fn doc(id: i64, text: &str) -> Document {
    Document::new()
        .with_field("id", id.to_string())
        .with_field("body", text)
}

fn indexer() -> Indexer {
    let store = create_index(&IndexConfig::new("memory")).unwrap();
    Indexer::new(store, IndexerConfig::default()).unwrap()
}

#[test]
fn test_delete_without_pruning_keeps_counter() {
    let indexer = indexer();
    let partition = PartitionKey::default();
    indexer.insert(&doc(1, "red shoes"), &partition).unwrap();
    indexer.insert(&doc(2, "red shoes"), &partition).unwrap();
    assert_eq!(indexer.total_documents().unwrap(), 2);

    // Every term of document 2 is still used by document 1.
    indexer.delete(2, &partition).unwrap();
    assert_eq!(indexer.total_documents().unwrap(), 2);

    indexer.delete(1, &partition).unwrap();
    assert_eq!(indexer.total_documents().unwrap(), 1);
}

#[test]
fn test_delete_with_pruning_decrements_once() {
    let indexer = indexer();
    let partition = PartitionKey::default();
    indexer.insert(&doc(1, "red shoes"), &partition).unwrap();
    indexer.insert(&doc(2, "blue hat scarf"), &partition).unwrap();

    // Three terms pruned, one decrement.
    indexer.delete(2, &partition).unwrap();
    assert_eq!(indexer.total_documents().unwrap(), 1);
}

#[test]
fn test_counter_never_goes_negative() {
    let indexer = indexer();
    let partition = PartitionKey::default();
    indexer.insert(&doc(1, "red"), &partition).unwrap();
    indexer.delete(1, &partition).unwrap();
    assert_eq!(indexer.total_documents().unwrap(), 0);

    // Deleting an unknown document prunes nothing.
    indexer.delete(1, &partition).unwrap();
    assert_eq!(indexer.total_documents().unwrap(), 0);
}

#[test]
fn test_counter_is_shared_by_all_partitions() {
    let indexer = indexer();
    indexer
        .insert(&doc(1, "red"), &PartitionKey::new("", "en").unwrap())
        .unwrap();
    indexer
        .insert(&doc(1, "rouge"), &PartitionKey::new("", "fr").unwrap())
        .unwrap();
    assert_eq!(indexer.total_documents().unwrap(), 2);
}
