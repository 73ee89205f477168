//! The GPU resize operation.

use std::time::{Duration, Instant};

use image::RgbaImage;
use resize_scale::plan::ScalePlan;
use tracing::debug;

use super::backend::{DeviceError, RenderDevice, TextureId};
use super::context::{ContextProvider, GraphicsContext};
use crate::encode::{EncodedImage, encode};
use crate::error::{ResizeError, ResizeResult};
use crate::request::ResizeRequest;
use crate::source::SourceImage;

/// Wall-clock time spent in each GPU stage of one resize.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageTimings {
    /// Bitmap copy plus texture upload.
    pub texture_creation: Duration,
    /// Pipeline build, pass recording, submission and the work-done wait.
    pub render: Duration,
    /// Surface readback into CPU memory.
    pub transfer: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.texture_creation + self.render + self.transfer
    }
}

/// Destroys the source texture when the operation leaves scope.
struct TextureGuard<'a> {
    device: &'a dyn RenderDevice,
    id: TextureId,
}

impl<'a> TextureGuard<'a> {
    async fn create(device: &'a dyn RenderDevice, source: &SourceImage) -> Result<Self, DeviceError> {
        let bitmap = source.to_bitmap();
        let id = device.create_texture(&bitmap).await?;
        Ok(Self { device, id })
    }
}

impl Drop for TextureGuard<'_> {
    fn drop(&mut self) {
        self.device.destroy_texture(self.id);
    }
}

/// Resize on the GPU and encode the result.
///
/// Returns `GpuUnavailable` when no context can be acquired. Any failure after
/// that is a `GpuResizeFailed`, except encoder errors which propagate as is.
pub async fn resize_gpu(
    contexts: &ContextProvider,
    source: &SourceImage,
    request: &ResizeRequest,
) -> ResizeResult<EncodedImage> {
    request.validate()?;
    let context = contexts
        .acquire()
        .await
        .ok_or_else(|| ResizeError::gpu_unavailable("no GPU adapter or device could be acquired"))?;
    let plan = request.resolve(source.size())?;

    let (pixels, timings) = render_resized(&context, source, &plan).await?;
    debug!(
        from = %plan.input,
        to = %plan.out,
        texture_ms = timings.texture_creation.as_secs_f64() * 1000.0,
        render_ms = timings.render.as_secs_f64() * 1000.0,
        transfer_ms = timings.transfer.as_secs_f64() * 1000.0,
        "gpu resize"
    );
    encode(&pixels, request.format)
}

/// Run the render part of a GPU resize and time each stage.
///
/// The surface stays leased from configuration to readback, and the source
/// texture is destroyed on every exit path.
pub async fn render_resized(
    context: &GraphicsContext,
    source: &SourceImage,
    plan: &ScalePlan,
) -> ResizeResult<(RgbaImage, StageTimings)> {
    let device = context.device();
    let mut lease = context.surface().lease().await;
    lease
        .configure(device, plan.out.w, plan.out.h)
        .await
        .map_err(|e| ResizeError::gpu_failed("configure_surface", e))?;

    let mut timings = StageTimings::default();

    let started = Instant::now();
    let texture = TextureGuard::create(device, source)
        .await
        .map_err(|e| ResizeError::gpu_failed("create_texture", e))?;
    timings.texture_creation = started.elapsed();

    let started = Instant::now();
    device
        .render_resize(texture.id)
        .await
        .map_err(|e| ResizeError::gpu_failed("render", e))?;
    device
        .submitted_work_done()
        .await
        .map_err(|e| ResizeError::gpu_failed("submitted_work_done", e))?;
    timings.render = started.elapsed();

    let started = Instant::now();
    let pixels = device
        .read_surface()
        .await
        .map_err(|e| ResizeError::gpu_failed("read_surface", e))?;
    timings.transfer = started.elapsed();

    drop(texture);
    drop(lease);

    if (pixels.width(), pixels.height()) != (plan.out.w, plan.out.h) {
        return Err(ResizeError::gpu_failed(
            "read_surface",
            DeviceError::Other(format!(
                "readback is {}x{}, expected {}",
                pixels.width(),
                pixels.height(),
                plan.out
            )),
        ));
    }
    Ok((pixels, timings))
}
