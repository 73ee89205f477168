//! wgpu implementation of the device seams.
//!
//! The output surface is an off-screen render target texture rather than a
//! window surface, so the engine runs headless. Readback goes through a
//! staging buffer with rows padded to `COPY_BYTES_PER_ROW_ALIGNMENT`.
//!
//! Every call that creates resources or submits work runs inside a
//! validation and an out-of-memory error scope, so wgpu errors come back as
//! [`DeviceError`] values instead of reaching the uncaptured-error handler.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use image::RgbaImage;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::backend::{
    AdapterSummary, DeviceError, DeviceProvider, GpuAdapter, RenderDevice, SurfaceConfig,
    SurfaceFormat, TextureId,
};
use super::pipeline::ResizePipeline;
use crate::config::PowerPreference;
use crate::source::Bitmap;

/// Provider backed by the platform's default wgpu backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct WgpuProvider;

#[async_trait]
impl DeviceProvider for WgpuProvider {
    async fn request_adapter(&self, preference: PowerPreference) -> Option<Box<dyn GpuAdapter>> {
        let instance = wgpu::Instance::default();
        let power_preference = match preference {
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        };
        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                debug!(error = %e, "wgpu found no adapter");
                return None;
            }
        };

        let info = adapter.get_info();
        info!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            "selected GPU adapter"
        );
        Some(Box::new(WgpuAdapter { adapter, instance }))
    }
}

struct WgpuAdapter {
    adapter: wgpu::Adapter,
    instance: wgpu::Instance,
}

impl WgpuAdapter {
    fn preferred_format(&self) -> SurfaceFormat {
        let needed = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC;
        let rgba = self
            .adapter
            .get_texture_format_features(wgpu::TextureFormat::Rgba8Unorm);
        if rgba.allowed_usages.contains(needed) {
            SurfaceFormat::Rgba8Unorm
        } else {
            SurfaceFormat::Bgra8Unorm
        }
    }
}

#[async_trait]
impl GpuAdapter for WgpuAdapter {
    fn summary(&self) -> AdapterSummary {
        let info = self.adapter.get_info();
        AdapterSummary {
            name: info.name,
            backend: format!("{:?}", info.backend),
            device_type: format!("{:?}", info.device_type),
        }
    }

    async fn request_device(&self) -> Result<Arc<dyn RenderDevice>, DeviceError> {
        let timestamp_query = self.adapter.features().contains(wgpu::Features::TIMESTAMP_QUERY);
        let required_features = if timestamp_query {
            wgpu::Features::TIMESTAMP_QUERY
        } else {
            wgpu::Features::empty()
        };
        let limits = self.adapter.limits();
        let (device, queue) = self
            .adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("hybrid-resize-device"),
                required_features,
                required_limits: limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| DeviceError::DeviceRequest(e.to_string()))?;

        device.on_uncaptured_error(Box::new(|e| {
            error!(error = %e, "uncaptured wgpu error");
        }));

        Ok(Arc::new(WgpuDevice {
            device,
            queue,
            format: self.preferred_format(),
            max_dimension: limits.max_texture_dimension_2d,
            timestamp_query,
            target: Mutex::new(None),
            textures: Mutex::new(HashMap::new()),
            next_texture: AtomicU64::new(1),
            _adapter: self.adapter.clone(),
            _instance: self.instance.clone(),
        }))
    }
}

struct RenderTarget {
    texture: wgpu::Texture,
    config: SurfaceConfig,
}

/// Fields drop top to bottom; the adapter and instance outlive the device.
struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: SurfaceFormat,
    max_dimension: u32,
    timestamp_query: bool,
    target: Mutex<Option<RenderTarget>>,
    textures: Mutex<HashMap<TextureId, wgpu::Texture>>,
    next_texture: AtomicU64,
    _adapter: wgpu::Adapter,
    _instance: wgpu::Instance,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn texture_format(format: SurfaceFormat) -> wgpu::TextureFormat {
    match format {
        SurfaceFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        SurfaceFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

/// Bytes per row rounded up to the copy alignment.
fn padded_row_bytes(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

impl WgpuDevice {
    /// Run `work` inside validation and out-of-memory error scopes.
    async fn scoped<T>(
        &self,
        work: impl FnOnce() -> Result<T, DeviceError>,
    ) -> Result<T, DeviceError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = work();
        let validation = self.device.pop_error_scope().await;
        let out_of_memory = self.device.pop_error_scope().await;

        if let Some(e) = out_of_memory {
            return Err(DeviceError::OutOfMemory(e.to_string()));
        }
        if let Some(e) = validation {
            return Err(DeviceError::Validation(e.to_string()));
        }
        result
    }

    fn check_size(&self, width: u32, height: u32) -> Result<(), DeviceError> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(DeviceError::TextureTooLarge {
                width,
                height,
                max: self.max_dimension,
            });
        }
        Ok(())
    }

    fn wait_idle(&self) -> Result<(), DeviceError> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|e| DeviceError::Poll(e.to_string()))
    }

    fn views(&self, id: TextureId) -> Result<(wgpu::TextureView, wgpu::TextureView, SurfaceFormat), DeviceError> {
        let textures = lock(&self.textures);
        let source = textures.get(&id).ok_or(DeviceError::UnknownTexture(id))?;
        let target = lock(&self.target);
        let target = target.as_ref().ok_or(DeviceError::SurfaceNotConfigured)?;
        Ok((
            source.create_view(&wgpu::TextureViewDescriptor::default()),
            target.texture.create_view(&wgpu::TextureViewDescriptor::default()),
            target.config.format,
        ))
    }
}

#[async_trait]
impl RenderDevice for WgpuDevice {
    fn preferred_format(&self) -> SurfaceFormat {
        self.format
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_dimension
    }

    fn supports_timestamp_query(&self) -> bool {
        self.timestamp_query
    }

    async fn configure_surface(&self, config: SurfaceConfig) -> Result<(), DeviceError> {
        self.check_size(config.width, config.height)?;
        let texture = self
            .scoped(|| {
                Ok(self.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("resize-output-surface"),
                    size: extent(config.width, config.height),
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: texture_format(config.format),
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                }))
            })
            .await?;

        let previous = lock(&self.target).replace(RenderTarget { texture, config });
        if let Some(previous) = previous {
            previous.texture.destroy();
        }
        Ok(())
    }

    async fn create_texture(&self, bitmap: &Bitmap) -> Result<TextureId, DeviceError> {
        self.check_size(bitmap.width(), bitmap.height())?;
        let texture = self
            .scoped(|| {
                let size = extent(bitmap.width(), bitmap.height());
                let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("resize-source"),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                });
                self.queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    bitmap.as_bytes(),
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(bitmap.row_bytes()),
                        rows_per_image: Some(bitmap.height()),
                    },
                    size,
                );
                Ok(texture)
            })
            .await?;

        let id = TextureId::new(self.next_texture.fetch_add(1, Ordering::Relaxed));
        lock(&self.textures).insert(id, texture);
        Ok(id)
    }

    async fn render_resize(&self, texture: TextureId) -> Result<(), DeviceError> {
        let (source, target, format) = self.views(texture)?;
        self.scoped(|| {
            let pipeline = ResizePipeline::build(&self.device, texture_format(format), &source);
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("resize-encoder"),
                });
            pipeline.record(&mut encoder, &target);
            self.queue.submit(Some(encoder.finish()));
            Ok(())
        })
        .await
    }

    async fn submitted_work_done(&self) -> Result<(), DeviceError> {
        let (done, signal) = oneshot::channel();
        self.queue.on_submitted_work_done(move || {
            let _ = done.send(());
        });
        self.wait_idle()?;
        signal.await.map_err(|_| DeviceError::SignalDropped)
    }

    async fn read_surface(&self) -> Result<RgbaImage, DeviceError> {
        let (buffer, config, padded) = self
            .scoped(|| {
                let target = lock(&self.target);
                let target = target.as_ref().ok_or(DeviceError::SurfaceNotConfigured)?;
                let config = target.config;
                let padded = padded_row_bytes(config.width);

                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("resize-readback"),
                    size: padded as u64 * config.height as u64,
                    usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                    mapped_at_creation: false,
                });
                let mut encoder = self
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                        label: Some("resize-readback-encoder"),
                    });
                encoder.copy_texture_to_buffer(
                    wgpu::TexelCopyTextureInfo {
                        texture: &target.texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    wgpu::TexelCopyBufferInfo {
                        buffer: &buffer,
                        layout: wgpu::TexelCopyBufferLayout {
                            offset: 0,
                            bytes_per_row: Some(padded),
                            rows_per_image: Some(config.height),
                        },
                    },
                    extent(config.width, config.height),
                );
                self.queue.submit(Some(encoder.finish()));
                Ok((buffer, config, padded))
            })
            .await?;

        let (mapped, signal) = oneshot::channel();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            let _ = mapped.send(result);
        });
        self.wait_idle()?;
        signal
            .await
            .map_err(|_| DeviceError::SignalDropped)?
            .map_err(|e| DeviceError::Map(e.to_string()))?;

        let pixels = {
            let data = buffer.slice(..).get_mapped_range();
            unpack_readback(&data, padded, config)
        };
        buffer.unmap();
        buffer.destroy();

        RgbaImage::from_raw(config.width, config.height, pixels)
            .ok_or_else(|| DeviceError::Map("readback length does not match the surface".into()))
    }

    fn destroy_texture(&self, texture: TextureId) {
        if let Some(texture) = lock(&self.textures).remove(&texture) {
            texture.destroy();
        }
    }

    fn destroy(&self) {
        for (_, texture) in lock(&self.textures).drain() {
            texture.destroy();
        }
        if let Some(target) = lock(&self.target).take() {
            target.texture.destroy();
        }
        self.device.destroy();
    }
}

/// Strip row padding from a mapped readback and reorder BGRA surfaces to RGBA.
fn unpack_readback(data: &[u8], padded: u32, config: SurfaceConfig) -> Vec<u8> {
    let row_bytes = config.width as usize * 4;
    let mut pixels = Vec::with_capacity(row_bytes * config.height as usize);
    for row in data.chunks(padded as usize).take(config.height as usize) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }
    if config.format == SurfaceFormat::Bgra8Unorm {
        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
    }
    pixels
}
