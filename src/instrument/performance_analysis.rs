// # Performance Analysis Module
//
// Per-operation instrumentation of the GPU resize path.
//
// ## Overview
//
// A single instrumented resize produces a [`PerformanceMetric`] with:
//
// - **Stage timings**: texture creation, render execution, data transfer
// - **Memory estimate**: source texture plus output surface, RGBA8
// - **Capabilities**: whether the device exposes timestamp queries
//
// Timings are wall-clock around awaited device calls. The memory figure is a
// static estimate, never a driver query; it ignores row padding, the
// readback buffer and driver overhead.

use std::time::Duration;

use resize_scale::plan::Size;

use crate::error::{ResizeError, ResizeResult};
use crate::gpu::{ContextProvider, render_resized};
use crate::request::ResizeRequest;
use crate::source::SourceImage;

/// Estimated GPU memory for one resize: `sw*sh*4 + dw*dh*4` bytes.
pub fn estimate_gpu_memory(source: Size, destination: Size) -> u64 {
    source.pixel_count() * 4 + destination.pixel_count() * 4
}

/// Instrumentation of one GPU resize.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetric {
    /// Source and destination sizes the metric was taken for.
    pub source: Size,
    pub destination: Size,
    /// Static estimate, see [`estimate_gpu_memory`].
    pub estimated_gpu_memory_bytes: u64,
    /// Pipeline build, submission and wait for completion.
    pub render_duration: Duration,
    /// Bitmap copy and texture upload.
    pub texture_creation_duration: Duration,
    /// Surface readback.
    pub data_transfer_duration: Duration,
    pub timestamp_query_supported: bool,
}

impl PerformanceMetric {
    pub fn total_duration(&self) -> Duration {
        self.render_duration + self.texture_creation_duration + self.data_transfer_duration
    }

    /// Human-readable summary in the style of the benchmark report.
    pub fn generate_report(&self) -> String {
        format!(
            r#"GPU Resize Metrics
══════════════════════════════════

Resize: {} -> {}
Estimated GPU Memory: {} bytes ({:.1} MB)
Timestamp Queries: {}

Stage Timings:
──────────────
• Texture Creation: {:.3} ms
• Render: {:.3} ms
• Data Transfer: {:.3} ms
• Total: {:.3} ms

Note: memory is estimated from texture sizes, not queried from the driver."#,
            self.source,
            self.destination,
            self.estimated_gpu_memory_bytes,
            self.estimated_gpu_memory_bytes as f64 / 1_000_000.0,
            if self.timestamp_query_supported {
                "supported"
            } else {
                "unsupported"
            },
            ms(self.texture_creation_duration),
            ms(self.render_duration),
            ms(self.data_transfer_duration),
            ms(self.total_duration()),
        )
    }
}

pub(crate) fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Run one instrumented GPU resize, discarding the pixels.
pub async fn measure(
    contexts: &ContextProvider,
    source: &SourceImage,
    request: &ResizeRequest,
) -> ResizeResult<PerformanceMetric> {
    let tag = |e: ResizeError| e.with_operation("measure");
    request.validate().map_err(tag)?;
    let context = contexts
        .acquire()
        .await
        .ok_or_else(|| tag(ResizeError::gpu_unavailable("no GPU context to measure")))?;
    let plan = request.resolve(source.size()).map_err(tag)?;
    let (_, timings) = render_resized(&context, source, &plan).await.map_err(tag)?;

    Ok(PerformanceMetric {
        source: plan.input,
        destination: plan.out,
        estimated_gpu_memory_bytes: estimate_gpu_memory(plan.input, plan.out),
        render_duration: timings.render,
        texture_creation_duration: timings.texture_creation,
        data_transfer_duration: timings.transfer,
        timestamp_query_supported: context.device().supports_timestamp_query(),
    })
}
