//! Tests for saving and restoring index snapshots.

use std::collections::HashMap;

use docqa_rag::{
    DistanceMetric, IndexEntry, IndexSnapshot, InMemoryVectorIndex, RagError, Segment, VectorIndex,
};

fn segment(ordinal: usize, text: &str) -> Segment {
    Segment {
        text: text.to_string(),
        document_id: "doc".to_string(),
        ordinal,
        start_offset: ordinal * 4,
        end_offset: ordinal * 4 + text.chars().count(),
        metadata: HashMap::from([("source".to_string(), "doc.txt".to_string())]),
    }
}

async fn populated_index() -> InMemoryVectorIndex {
    let index = InMemoryVectorIndex::with_metric(DistanceMetric::Euclidean);
    index.insert(vec![0.0, 1.0, 0.0], segment(0, "zero")).await.unwrap();
    index.insert(vec![1.0, 0.0, 0.0], segment(1, "one")).await.unwrap();
    index.insert(vec![1.0, 0.0, 0.0], segment(2, "two")).await.unwrap();
    index
}

#[tokio::test]
async fn saved_snapshot_restores_identical_search_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");

    let original = populated_index().await;
    original.snapshot().await.save(&path).unwrap();

    let restored = InMemoryVectorIndex::from_snapshot(IndexSnapshot::load(&path).unwrap()).unwrap();
    let query = [0.9, 0.1, 0.0];
    assert_eq!(
        original.search(&query, 3).await.unwrap(),
        restored.search(&query, 3).await.unwrap()
    );
    assert_eq!(restored.metric(), DistanceMetric::Euclidean);
    assert_eq!(restored.dimensions().await, Some(3));
}

#[tokio::test]
async fn restored_index_continues_sequence_numbering() {
    let snapshot = populated_index().await.snapshot().await;
    let restored = InMemoryVectorIndex::from_snapshot(snapshot).unwrap();
    let sequence = restored.insert(vec![0.0, 0.0, 1.0], segment(3, "three")).await.unwrap();
    assert_eq!(sequence, 3);
}

#[tokio::test]
async fn snapshot_header_records_dimensions_once() {
    let snapshot = populated_index().await.snapshot().await;
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["dimensions"], 3);
    assert_eq!(json["metric"], "euclidean");
    assert_eq!(json["entries"].as_array().unwrap().len(), 3);
    assert_eq!(json["entries"][1]["sequence"], 1);
}

#[tokio::test]
async fn empty_index_round_trips() {
    let snapshot = InMemoryVectorIndex::new().snapshot().await;
    assert_eq!(snapshot.dimensions, None);
    let restored = InMemoryVectorIndex::from_snapshot(snapshot).unwrap();
    assert!(restored.is_empty().await);
}

#[tokio::test]
async fn vector_disagreeing_with_header_is_rejected() {
    let mut snapshot = populated_index().await.snapshot().await;
    snapshot.entries.push(IndexEntry {
        vector: vec![1.0, 2.0],
        segment: segment(3, "bad"),
        sequence: 3,
    });
    assert!(matches!(
        InMemoryVectorIndex::from_snapshot(snapshot),
        Err(RagError::DimensionMismatch { expected: 3, actual: 2 })
    ));
}

#[tokio::test]
async fn duplicate_sequences_are_rejected() {
    let mut snapshot = populated_index().await.snapshot().await;
    snapshot.entries[2].sequence = 0;
    assert!(matches!(snapshot.validate(), Err(RagError::Snapshot(_))));
}

#[test]
fn missing_or_malformed_files_are_snapshot_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        IndexSnapshot::load(dir.path().join("missing.json")),
        Err(RagError::Snapshot(_))
    ));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "not json").unwrap();
    assert!(matches!(IndexSnapshot::load(&garbage), Err(RagError::Snapshot(_))));
}
