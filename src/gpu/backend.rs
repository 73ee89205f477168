//! Device seams.
//!
//! The engine talks to the graphics stack only through these traits, so the
//! context manager, the resize operation and the batch loop run unchanged over
//! wgpu or over an in-process fake.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;

use crate::config::PowerPreference;
use crate::source::Bitmap;

/// Pixel format of the off-screen output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    Rgba8Unorm,
    /// Read back with red and blue swapped.
    Bgra8Unorm,
}

impl fmt::Display for SurfaceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceFormat::Rgba8Unorm => write!(f, "rgba8unorm"),
            SurfaceFormat::Bgra8Unorm => write!(f, "bgra8unorm"),
        }
    }
}

/// Current configuration of the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub format: SurfaceFormat,
    pub width: u32,
    pub height: u32,
}

/// Handle to a source texture owned by a [`RenderDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// What the engine logs and reports about the selected adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSummary {
    pub name: String,
    pub backend: String,
    pub device_type: String,
}

impl fmt::Display for AdapterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.backend, self.device_type)
    }
}

/// Failures reported by a device implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The adapter refused the logical device.
    DeviceRequest(String),
    /// A command or resource failed validation.
    Validation(String),
    /// The device ran out of memory.
    OutOfMemory(String),
    /// Rendering or readback before `configure_surface`.
    SurfaceNotConfigured,
    /// The texture handle was never created or is already destroyed.
    UnknownTexture(TextureId),
    /// A texture or surface exceeds `max_texture_dimension_2d`.
    TextureTooLarge { width: u32, height: u32, max: u32 },
    /// Waiting on the device failed.
    Poll(String),
    /// Mapping the readback buffer failed.
    Map(String),
    /// A completion callback was dropped without firing.
    SignalDropped,
    /// An injected or implementation-specific failure.
    Other(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::DeviceRequest(msg) => write!(f, "device request failed: {}", msg),
            DeviceError::Validation(msg) => write!(f, "validation error: {}", msg),
            DeviceError::OutOfMemory(msg) => write!(f, "out of memory: {}", msg),
            DeviceError::SurfaceNotConfigured => write!(f, "output surface is not configured"),
            DeviceError::UnknownTexture(id) => write!(f, "unknown {}", id),
            DeviceError::TextureTooLarge { width, height, max } => {
                write!(f, "{}x{} exceeds the device limit of {} pixels per side", width, height, max)
            }
            DeviceError::Poll(msg) => write!(f, "device poll failed: {}", msg),
            DeviceError::Map(msg) => write!(f, "buffer map failed: {}", msg),
            DeviceError::SignalDropped => write!(f, "completion signal dropped"),
            DeviceError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Entry point to a graphics stack. Returning `None` means "no GPU here".
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    async fn request_adapter(&self, preference: PowerPreference) -> Option<Box<dyn GpuAdapter>>;
}

/// A physical adapter that can open a logical device.
#[async_trait]
pub trait GpuAdapter: Send + Sync {
    fn summary(&self) -> AdapterSummary;

    async fn request_device(&self) -> Result<Arc<dyn RenderDevice>, DeviceError>;
}

/// A logical device with one off-screen output surface.
///
/// Calls are issued one operation at a time; the context holds the surface
/// lock for the whole operation.
#[async_trait]
pub trait RenderDevice: Send + Sync {
    /// Format the output surface should be configured with.
    fn preferred_format(&self) -> SurfaceFormat;

    /// Largest width or height of a 2D texture.
    fn max_texture_dimension(&self) -> u32;

    fn supports_timestamp_query(&self) -> bool;

    /// (Re)allocate the output surface.
    async fn configure_surface(&self, config: SurfaceConfig) -> Result<(), DeviceError>;

    /// Upload `bitmap` into a new sampled texture of the same size.
    async fn create_texture(&self, bitmap: &Bitmap) -> Result<TextureId, DeviceError>;

    /// Build the resize pipeline for `texture`, record one clear-and-draw pass
    /// into the output surface and submit it.
    async fn render_resize(&self, texture: TextureId) -> Result<(), DeviceError>;

    /// Resolve once all submitted work has finished.
    async fn submitted_work_done(&self) -> Result<(), DeviceError>;

    /// Copy the output surface into CPU memory as RGBA8.
    async fn read_surface(&self) -> Result<RgbaImage, DeviceError>;

    /// Release a source texture. Unknown ids are ignored.
    fn destroy_texture(&self, texture: TextureId);

    /// Release the device and everything it owns.
    fn destroy(&self);
}

/// Provider for builds and hosts without a GPU.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGpuProvider;

#[async_trait]
impl DeviceProvider for NoGpuProvider {
    async fn request_adapter(&self, _preference: PowerPreference) -> Option<Box<dyn GpuAdapter>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_gpu_provider_has_no_adapter() {
        let adapter = NoGpuProvider
            .request_adapter(PowerPreference::HighPerformance)
            .await;
        assert!(adapter.is_none());
    }

    #[test]
    fn device_error_messages() {
        let err = DeviceError::TextureTooLarge {
            width: 9000,
            height: 10,
            max: 8192,
        };
        assert_eq!(
            err.to_string(),
            "9000x10 exceeds the device limit of 8192 pixels per side"
        );
        assert_eq!(
            DeviceError::UnknownTexture(TextureId::new(4)).to_string(),
            "unknown texture#4"
        );
    }
}
