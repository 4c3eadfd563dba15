//! Blind reconstructor tests.

use std::time::Duration;

use seine_types::Chunk;

use super::helpers::{
    sample_chunks, wait_for, MemorySink, EMPTY_TOP, REPEATED, REPEATED_X3_TOP, SAMPLE,
    SAMPLE_TOP,
};
use crate::{blind_reconstruct, StreamError};

#[tokio::test]
async fn test_blind_early_close_reports_queued_chunks() {
    let sink = MemorySink::new();
    let rec = blind_reconstruct(sink.clone(), Duration::from_secs(1));

    let chunk = sample_chunks()[1].clone();
    rec.submit(chunk.clone(), 1).unwrap();
    let err = rec.submit(chunk, 1).unwrap_err();
    assert!(matches!(err, StreamError::ResubmitIndex));

    // Index 0 never arrived, so the chunk at index 1 is still queued.
    let err = rec.close().await.unwrap_err();
    assert!(matches!(err, StreamError::UnprocessedChunks));
    assert_eq!(
        err.to_string(),
        "there are unprocessed chunks in the queue"
    );

    assert_eq!(rec.sum224().unwrap().to_string(), EMPTY_TOP);
    assert!(sink.contents().is_empty());
}

#[tokio::test]
async fn test_blind_full_cycle_out_of_order() {
    let sink = MemorySink::new();
    let rec = blind_reconstruct(sink.clone(), Duration::from_secs(1));

    let (finished, _) = rec.err();
    assert!(!finished);

    let chunks = sample_chunks();
    for index in [1, 3, 2, 0, 4] {
        rec.submit(chunks[index].clone(), index).unwrap();
    }

    rec.close().await.unwrap();

    let (finished, error) = rec.err();
    assert!(finished);
    assert!(error.is_none());
    assert_eq!(rec.sum224().unwrap().to_string(), SAMPLE_TOP);

    // close() does not wait for the flush.
    wait_for(|| sink.contents() == SAMPLE).await;
}

#[tokio::test]
async fn test_blind_same_content_under_different_indexes() {
    let sink = MemorySink::new();
    let rec = blind_reconstruct(sink.clone(), Duration::from_secs(1));

    let chunk = Chunk::new(REPEATED);
    for index in [2, 0, 1] {
        rec.submit(chunk.clone(), index).unwrap();
    }

    rec.close().await.unwrap();

    assert_eq!(rec.sum224().unwrap().to_string(), REPEATED_X3_TOP);
    wait_for(|| sink.contents() == [REPEATED, REPEATED, REPEATED].concat()).await;
}

#[tokio::test]
async fn test_blind_submit_after_close_fails() {
    let rec = blind_reconstruct(MemorySink::new(), Duration::from_secs(1));

    rec.close().await.unwrap();

    let err = rec.submit(Chunk::new(&b"late"[..]), 0).unwrap_err();
    assert!(matches!(err, StreamError::Finished));
    assert_eq!(err.to_string(), "finished reconstructor");
}

#[tokio::test]
async fn test_blind_timeout_without_close() {
    let rec = blind_reconstruct(MemorySink::new(), Duration::from_millis(200));

    rec.submit(Chunk::new(&b"stranded"[..]), 1).unwrap();

    wait_for(|| rec.err().0).await;
    let (_, error) = rec.err();
    assert!(matches!(error, Some(StreamError::DeadlineExceeded)));

    let err = rec.submit(Chunk::new(&b"late"[..]), 2).unwrap_err();
    assert!(matches!(err, StreamError::Finished));
}
