//! High-level engine tying configuration, context and both resize paths together.

use std::sync::Arc;

use tracing::debug;

use crate::batch::{self, Progress};
use crate::config::EngineConfig;
use crate::cpu;
use crate::encode::EncodedImage;
use crate::error::ResizeResult;
use crate::gpu::{self, ContextProvider, DeviceProvider};
use crate::instrument::{self, BenchmarkSuite, PerformanceMetric, Scenario};
use crate::request::ResizeRequest;
use crate::source::SourceImage;

/// Resize engine with a lazily created GPU context and a CPU fallback.
///
/// # Examples
///
/// ```rust,no_run
/// use hybrid_image_resize::{EngineConfig, ResizeEngine, ResizeRequest, SourceImage};
///
/// # async fn example(bytes: &[u8]) -> hybrid_image_resize::ResizeResult<()> {
/// let engine = ResizeEngine::new(EngineConfig::default())?;
/// let source = SourceImage::decode(bytes)?;
/// let thumbnail = engine.resize(&source, &ResizeRequest::width(320)).await?;
/// println!("{}", thumbnail.as_str());
/// engine.release().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResizeEngine {
    config: EngineConfig,
    contexts: ContextProvider,
}

impl ResizeEngine {
    /// Engine over the default device provider.
    pub fn new(config: EngineConfig) -> ResizeResult<Self> {
        Self::with_provider(config, gpu::default_provider())
    }

    /// Engine over an injected device provider.
    pub fn with_provider(config: EngineConfig, provider: Arc<dyn DeviceProvider>) -> ResizeResult<Self> {
        config.validate()?;
        let contexts = ContextProvider::new(provider, config.power_preference);
        Ok(Self { config, contexts })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn contexts(&self) -> &ContextProvider {
        &self.contexts
    }

    /// True while a GPU context is cached.
    pub fn is_gpu_available(&self) -> bool {
        self.contexts.is_available()
    }

    /// Resize with the preferred path.
    ///
    /// Only `GpuUnavailable` triggers the CPU fallback; a GPU failure after
    /// the context was acquired propagates.
    pub async fn resize(&self, source: &SourceImage, request: &ResizeRequest) -> ResizeResult<EncodedImage> {
        if !self.config.prefer_gpu {
            return self.resize_cpu(source, request).await;
        }
        match self.resize_gpu(source, request).await {
            Err(e) if e.is_gpu_unavailable() && self.config.fallback_to_cpu => {
                debug!(reason = %e, "falling back to CPU resize");
                self.resize_cpu(source, request).await
            }
            other => other,
        }
    }

    pub async fn resize_gpu(&self, source: &SourceImage, request: &ResizeRequest) -> ResizeResult<EncodedImage> {
        gpu::resize_gpu(&self.contexts, source, request)
            .await
            .map_err(|e| e.with_operation("resize_gpu"))
    }

    pub async fn resize_cpu(&self, source: &SourceImage, request: &ResizeRequest) -> ResizeResult<EncodedImage> {
        cpu::resize_cpu(source, request)
            .await
            .map_err(|e| e.with_operation("resize_cpu"))
    }

    /// GPU batch; failed items become empty sentinels.
    pub async fn batch_resize(
        &self,
        sources: &[SourceImage],
        request: &ResizeRequest,
        on_progress: Option<Progress<'_>>,
    ) -> Vec<EncodedImage> {
        batch::batch_resize(&self.contexts, sources, request, on_progress).await
    }

    /// GPU batch keeping each item's error.
    pub async fn batch_resize_results(
        &self,
        sources: &[SourceImage],
        request: &ResizeRequest,
        on_progress: Option<Progress<'_>>,
    ) -> Vec<ResizeResult<EncodedImage>> {
        batch::batch_resize_results(&self.contexts, sources, request, on_progress).await
    }

    pub async fn measure(&self, source: &SourceImage, request: &ResizeRequest) -> ResizeResult<PerformanceMetric> {
        instrument::measure(&self.contexts, source, request).await
    }

    /// Benchmark the standard scenarios.
    pub async fn run_benchmark_suite(&self) -> Vec<BenchmarkSuite> {
        self.run_benchmark_suite_with(&instrument::standard_scenarios()).await
    }

    pub async fn run_benchmark_suite_with(&self, scenarios: &[Scenario]) -> Vec<BenchmarkSuite> {
        instrument::run_benchmark_suite(&self.contexts, scenarios, self.config.benchmark_iterations).await
    }

    /// Tear down the GPU context; the next GPU call re-initialises it.
    pub async fn release(&self) {
        self.contexts.release().await;
    }
}
