//! Batch ordering, failure isolation and progress reporting.

mod common;

use common::assertions::assert_encoded;
use common::mock_gpu::{Faults, MockProvider};
use common::test_images::{checkerboard, solid};
use hybrid_image_resize::{EngineConfig, ResizeEngine, ResizeError, ResizeRequest, SourceImage};

fn sources() -> Vec<SourceImage> {
    vec![
        solid(100, 50, [255, 0, 0, 255]),
        checkerboard(64, 64),
        solid(30, 90, [0, 0, 255, 255]),
    ]
}

#[tokio::test]
async fn test_batch_keeps_order_and_length() {
    let engine = ResizeEngine::with_provider(EngineConfig::default(), MockProvider::new()).unwrap();
    let mut progress = Vec::new();
    let mut record = |done: usize, total: usize| progress.push((done, total));

    let results = engine
        .batch_resize(&sources(), &ResizeRequest::height(20), Some(&mut record))
        .await;

    assert_eq!(results.len(), 3);
    assert_encoded(&results[0], "image/png", 40, 20);
    assert_encoded(&results[1], "image/png", 20, 20);
    assert_encoded(&results[2], "image/png", 7, 20);
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn test_second_texture_failure_yields_sentinel() {
    let provider = MockProvider::with_faults(Faults {
        texture_creation: Some(2),
        ..Faults::default()
    });
    let stats = provider.stats();
    let engine = ResizeEngine::with_provider(EngineConfig::default(), provider).unwrap();
    let mut progress = Vec::new();
    let mut record = |done: usize, total: usize| progress.push((done, total));

    let results = engine
        .batch_resize(&sources(), &ResizeRequest::width(10), Some(&mut record))
        .await;

    assert_eq!(results.len(), 3);
    assert!(!results[0].is_empty());
    assert_eq!(results[1].as_str(), "");
    assert!(!results[2].is_empty());
    assert_eq!(progress, vec![(1, 3), (3, 3)]);
    assert_eq!(stats.live_textures(), 0);
}

#[tokio::test]
async fn test_results_variant_reports_cause() {
    let provider = MockProvider::with_faults(Faults {
        texture_creation: Some(2),
        ..Faults::default()
    });
    let engine = ResizeEngine::with_provider(EngineConfig::default(), provider).unwrap();

    let results = engine
        .batch_resize_results(&sources(), &ResizeRequest::width(10), None)
        .await;

    assert!(results[0].is_ok());
    assert!(results[2].is_ok());
    match &results[1] {
        Err(ResizeError::BatchItemFailed { index, source, .. }) => {
            assert_eq!(*index, 1);
            assert_eq!(source.category(), "gpu_resize_failed");
            assert!(source.to_string().contains("create_texture"));
        }
        other => panic!("expected BatchItemFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_batch() {
    let engine = ResizeEngine::with_provider(EngineConfig::default(), MockProvider::new()).unwrap();
    let results = engine.batch_resize(&[], &ResizeRequest::width(10), None).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_batch_does_not_fall_back_to_cpu() {
    let engine = ResizeEngine::with_provider(EngineConfig::default(), MockProvider::unavailable()).unwrap();
    let results = engine.batch_resize(&sources(), &ResizeRequest::width(10), None).await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_empty()));
}
