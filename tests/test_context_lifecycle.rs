//! Graphics context acquisition, caching, release and GPU failure handling.

mod common;

use std::sync::Arc;

use common::assertions::{assert_color_near, assert_encoded};
use common::mock_gpu::{Faults, MockProvider};
use common::test_images::solid;
use hybrid_image_resize::gpu::{ContextProvider, DeviceError, SurfaceFormat};
use hybrid_image_resize::{EngineConfig, PowerPreference, ResizeEngine, ResizeError, ResizeRequest};

#[tokio::test]
async fn test_acquire_is_idempotent() {
    let provider = MockProvider::new();
    let stats = provider.stats();
    let contexts = ContextProvider::new(provider, PowerPreference::HighPerformance);

    assert!(!contexts.is_available());
    let first = contexts.acquire().await.expect("mock adapter is available");
    assert!(contexts.is_available());
    let second = contexts.acquire().await.expect("cached context");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(stats.adapter_requests(), 1);
    assert_eq!(first.adapter().name, "mock adapter");
}

#[tokio::test]
async fn test_release_then_acquire_requests_new_adapter() {
    let provider = MockProvider::new();
    let stats = provider.stats();
    let contexts = ContextProvider::new(provider, PowerPreference::HighPerformance);

    contexts.acquire().await.unwrap();
    contexts.release().await;
    assert!(!contexts.is_available());
    assert_eq!(stats.devices_destroyed(), 1);

    contexts.acquire().await.unwrap();
    assert!(contexts.is_available());
    assert_eq!(stats.adapter_requests(), 2);
}

#[tokio::test]
async fn test_release_waits_for_in_flight_operation() {
    let provider = MockProvider::new();
    let stats = provider.stats();
    let contexts = ContextProvider::new(provider, PowerPreference::HighPerformance);

    let context = contexts.acquire().await.unwrap();
    let lease = context.surface().lease().await;

    let release = contexts.release();
    tokio::pin!(release);
    tokio::select! {
        biased;
        _ = &mut release => panic!("release finished while the surface was leased"),
        _ = std::future::ready(()) => {}
    }
    assert!(!contexts.is_available());
    assert_eq!(stats.devices_destroyed(), 0);

    drop(lease);
    release.await;
    assert_eq!(stats.devices_destroyed(), 1);
}

#[tokio::test]
async fn test_concurrent_acquire_initialises_once() {
    let provider = MockProvider::new();
    let stats = provider.stats();
    let contexts = ContextProvider::new(provider, PowerPreference::LowPower);

    let (a, b) = tokio::join!(contexts.acquire(), contexts.acquire());
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    assert_eq!(stats.adapter_requests(), 1);
}

#[tokio::test]
async fn test_missing_adapter_is_unavailable_not_error() {
    let provider = MockProvider::unavailable();
    let stats = provider.stats();
    let contexts = ContextProvider::new(provider, PowerPreference::HighPerformance);

    assert!(contexts.acquire().await.is_none());
    assert!(!contexts.is_available());
    // Nothing was cached, so the next call asks again.
    assert!(contexts.acquire().await.is_none());
    assert_eq!(stats.adapter_requests(), 2);
}

#[tokio::test]
async fn test_device_request_failure_is_unavailable() {
    let engine = ResizeEngine::with_provider(
        EngineConfig {
            fallback_to_cpu: false,
            ..EngineConfig::default()
        },
        MockProvider::with_faults(Faults {
            device_request: true,
            ..Faults::default()
        }),
    )
    .unwrap();

    let err = engine
        .resize(&solid(8, 8, [0, 0, 0, 255]), &ResizeRequest::width(4))
        .await
        .unwrap_err();
    assert!(err.is_gpu_unavailable());
    assert!(!engine.is_gpu_available());
}

#[tokio::test]
async fn test_render_failure_propagates_and_cleans_up() {
    let provider = MockProvider::with_faults(Faults {
        render: true,
        ..Faults::default()
    });
    let stats = provider.stats();
    let engine = ResizeEngine::with_provider(EngineConfig::default(), provider).unwrap();

    let err = engine
        .resize(&solid(16, 16, [0, 0, 0, 255]), &ResizeRequest::width(8))
        .await
        .unwrap_err();

    // Not masked by the CPU fallback.
    match err {
        ResizeError::GpuResizeFailed { stage, source, .. } => {
            assert_eq!(stage, "render");
            assert!(matches!(source, DeviceError::Validation(_)));
        }
        other => panic!("expected GpuResizeFailed, got {:?}", other),
    }
    assert_eq!(stats.live_textures(), 0);
    assert!(engine.is_gpu_available());
}

#[tokio::test]
async fn test_textures_released_after_success() {
    let provider = MockProvider::new();
    let stats = provider.stats();
    let engine = ResizeEngine::with_provider(EngineConfig::default(), provider).unwrap();

    for _ in 0..3 {
        engine
            .resize_gpu(&solid(32, 32, [0, 0, 0, 255]), &ResizeRequest::width(16))
            .await
            .unwrap();
    }
    assert_eq!(stats.renders(), 3);
    assert_eq!(stats.live_textures(), 0);
}

// Devices return RGBA from `read_surface` whatever the surface format; the
// wgpu swizzle itself is unit-tested next to `unpack_readback`.
#[tokio::test]
async fn test_bgra_preferred_surface_returns_rgba_output() {
    let engine = ResizeEngine::with_provider(
        EngineConfig::default(),
        MockProvider::with_faults(Faults {
            format: Some(SurfaceFormat::Bgra8Unorm),
            ..Faults::default()
        }),
    )
    .unwrap();

    let encoded = engine
        .resize_gpu(&solid(40, 20, [200, 40, 10, 255]), &ResizeRequest::width(10))
        .await
        .unwrap();
    let pixels = assert_encoded(&encoded, "image/png", 10, 5);
    assert_color_near(pixels.get_pixel(5, 2).0, [200, 40, 10, 255], 1);

    let surface = engine.contexts().acquire().await.unwrap().surface().current().await;
    assert_eq!(surface.format, SurfaceFormat::Bgra8Unorm);
    assert_eq!((surface.width, surface.height), (10, 5));
}
