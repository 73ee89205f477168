//! Common test utilities and helpers for the resize library tests
//!
//! This module provides a scriptable in-process GPU, synthetic source images
//! and assertions on encoded output.

#![allow(dead_code)]

/// In-process device provider that records how it is used
pub mod mock_gpu {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use hybrid_image_resize::PowerPreference;
    use hybrid_image_resize::gpu::{
        AdapterSummary, DeviceError, DeviceProvider, GpuAdapter, RenderDevice, SurfaceConfig,
        SurfaceFormat, TextureId,
    };
    use hybrid_image_resize::source::Bitmap;
    use image::RgbaImage;
    use image::imageops::{self, FilterType};

    /// Failure injection for the fake device
    #[derive(Debug, Clone, Default)]
    pub struct Faults {
        /// No adapter at all
        pub no_adapter: bool,
        /// The adapter refuses to open a device
        pub device_request: bool,
        /// Fail the n-th `create_texture` call (1-based)
        pub texture_creation: Option<usize>,
        /// Fail every `render_resize` call
        pub render: bool,
        /// Surface format reported by the device
        pub format: Option<SurfaceFormat>,
    }

    /// Shared counters, readable after the provider was moved into an engine
    #[derive(Debug, Default)]
    pub struct Stats {
        pub adapter_requests: AtomicUsize,
        pub devices_created: AtomicUsize,
        pub devices_destroyed: AtomicUsize,
        pub textures_created: AtomicUsize,
        pub textures_destroyed: AtomicUsize,
        pub renders: AtomicUsize,
    }

    impl Stats {
        pub fn adapter_requests(&self) -> usize {
            self.adapter_requests.load(Ordering::SeqCst)
        }

        pub fn devices_destroyed(&self) -> usize {
            self.devices_destroyed.load(Ordering::SeqCst)
        }

        /// Textures created and not yet destroyed
        pub fn live_textures(&self) -> usize {
            self.textures_created.load(Ordering::SeqCst) - self.textures_destroyed.load(Ordering::SeqCst)
        }

        pub fn renders(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }
    }

    /// Provider handing out [`FakeDevice`]s
    pub struct MockProvider {
        faults: Faults,
        stats: Arc<Stats>,
    }

    impl MockProvider {
        pub fn new() -> Arc<Self> {
            Self::with_faults(Faults::default())
        }

        pub fn unavailable() -> Arc<Self> {
            Self::with_faults(Faults {
                no_adapter: true,
                ..Faults::default()
            })
        }

        pub fn with_faults(faults: Faults) -> Arc<Self> {
            Arc::new(Self {
                faults,
                stats: Arc::new(Stats::default()),
            })
        }

        pub fn stats(&self) -> Arc<Stats> {
            self.stats.clone()
        }
    }

    #[async_trait]
    impl DeviceProvider for MockProvider {
        async fn request_adapter(&self, _preference: PowerPreference) -> Option<Box<dyn GpuAdapter>> {
            self.stats.adapter_requests.fetch_add(1, Ordering::SeqCst);
            if self.faults.no_adapter {
                return None;
            }
            Some(Box::new(MockAdapter {
                faults: self.faults.clone(),
                stats: self.stats.clone(),
            }))
        }
    }

    struct MockAdapter {
        faults: Faults,
        stats: Arc<Stats>,
    }

    #[async_trait]
    impl GpuAdapter for MockAdapter {
        fn summary(&self) -> AdapterSummary {
            AdapterSummary {
                name: "mock adapter".to_string(),
                backend: "Mock".to_string(),
                device_type: "VirtualGpu".to_string(),
            }
        }

        async fn request_device(&self) -> Result<Arc<dyn RenderDevice>, DeviceError> {
            if self.faults.device_request {
                return Err(DeviceError::DeviceRequest("mock refuses".to_string()));
            }
            self.stats.devices_created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FakeDevice {
                faults: self.faults.clone(),
                stats: self.stats.clone(),
                state: Mutex::new(DeviceState::default()),
            }))
        }
    }

    #[derive(Default)]
    struct DeviceState {
        surface: Option<(SurfaceConfig, RgbaImage)>,
        textures: HashMap<TextureId, RgbaImage>,
        create_calls: usize,
        next_id: u64,
    }

    /// Resizes with `image::imageops` in place of a render pass
    pub struct FakeDevice {
        faults: Faults,
        stats: Arc<Stats>,
        state: Mutex<DeviceState>,
    }

    #[async_trait]
    impl RenderDevice for FakeDevice {
        fn preferred_format(&self) -> SurfaceFormat {
            self.faults.format.unwrap_or(SurfaceFormat::Rgba8Unorm)
        }

        fn max_texture_dimension(&self) -> u32 {
            8192
        }

        fn supports_timestamp_query(&self) -> bool {
            false
        }

        async fn configure_surface(&self, config: SurfaceConfig) -> Result<(), DeviceError> {
            let mut state = self.state.lock().unwrap();
            state.surface = Some((config, RgbaImage::new(config.width, config.height)));
            Ok(())
        }

        async fn create_texture(&self, bitmap: &Bitmap) -> Result<TextureId, DeviceError> {
            let mut state = self.state.lock().unwrap();
            state.create_calls += 1;
            if self.faults.texture_creation == Some(state.create_calls) {
                return Err(DeviceError::OutOfMemory("injected texture failure".to_string()));
            }
            let image = RgbaImage::from_raw(bitmap.width(), bitmap.height(), bitmap.as_bytes().to_vec())
                .ok_or_else(|| DeviceError::Validation("bitmap size mismatch".to_string()))?;
            state.next_id += 1;
            let id = TextureId::new(state.next_id);
            state.textures.insert(id, image);
            self.stats.textures_created.fetch_add(1, Ordering::SeqCst);
            Ok(id)
        }

        async fn render_resize(&self, texture: TextureId) -> Result<(), DeviceError> {
            if self.faults.render {
                return Err(DeviceError::Validation("injected render failure".to_string()));
            }
            let mut state = self.state.lock().unwrap();
            let source = state
                .textures
                .get(&texture)
                .ok_or(DeviceError::UnknownTexture(texture))?;
            let (config, _) = state.surface.as_ref().ok_or(DeviceError::SurfaceNotConfigured)?;
            let resized = imageops::resize(source, config.width, config.height, FilterType::Triangle);
            let config = *config;
            state.surface = Some((config, resized));
            self.stats.renders.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn submitted_work_done(&self) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn read_surface(&self) -> Result<RgbaImage, DeviceError> {
            let state = self.state.lock().unwrap();
            state
                .surface
                .as_ref()
                .map(|(_, image)| image.clone())
                .ok_or(DeviceError::SurfaceNotConfigured)
        }

        fn destroy_texture(&self, texture: TextureId) {
            if self.state.lock().unwrap().textures.remove(&texture).is_some() {
                self.stats.textures_destroyed.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn destroy(&self) {
            let mut state = self.state.lock().unwrap();
            let leaked = state.textures.len();
            state.textures.clear();
            state.surface = None;
            self.stats.textures_destroyed.fetch_add(leaked, Ordering::SeqCst);
            self.stats.devices_destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Synthetic source images
pub mod test_images {
    use hybrid_image_resize::SourceImage;
    use image::{Rgba, RgbaImage};

    pub const FHD: (u32, u32) = (1920, 1080);
    pub const SQUARE_256: (u32, u32) = (256, 256);

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> SourceImage {
        SourceImage::from_rgba(RgbaImage::from_pixel(width, height, Rgba(color))).unwrap()
    }

    /// 32px checkerboard, useful to spot flipped or shifted output
    pub fn checkerboard(width: u32, height: u32) -> SourceImage {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            if (x / 32 + y / 32) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        SourceImage::from_rgba(image).unwrap()
    }
}

/// Assertions on encoded images
pub mod assertions {
    use hybrid_image_resize::EncodedImage;
    use image::RgbaImage;

    /// Check the URI header and the decoded dimensions, returning the pixels
    pub fn assert_encoded(encoded: &EncodedImage, mime: &str, width: u32, height: u32) -> RgbaImage {
        assert!(!encoded.is_empty(), "expected an image, got the empty sentinel");
        assert_eq!(encoded.mime_type(), Some(mime));
        assert_eq!((encoded.width(), encoded.height()), (width, height));

        let bytes = encoded.decode_payload().expect("payload decodes as base64");
        let decoded = image::load_from_memory(&bytes).expect("payload is a valid image").into_rgba8();
        assert_eq!(decoded.dimensions(), (width, height));
        decoded
    }

    /// Per-channel comparison with tolerance
    pub fn assert_color_near(actual: [u8; 4], expected: [u8; 4], tolerance: u8) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!(
                a.abs_diff(*e) <= tolerance,
                "color {:?} is not within {} of {:?}",
                actual,
                tolerance,
                expected
            );
        }
    }
}
