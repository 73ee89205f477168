//! # Hybrid Image Resize Library
//!
//! GPU-accelerated image resizing with an automatic CPU fallback and a
//! benchmarking harness that compares the two paths.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `gpu`: context lifecycle, device seams, render pipeline and the GPU resize
//! - `cpu`: fallback resize on `fast_image_resize`
//! - `batch`: sequential GPU batches with per-item failure isolation
//! - `instrument`: stage timings, memory estimates and benchmark suites
//! - `request`, `source`, `encode`: inputs and data URI outputs
//! - `config`, `error`: engine settings and the error taxonomy
//!
//! ## Features
//!
//! - **Lazy GPU context**: one adapter/device/surface, created on first use
//!   and released explicitly
//! - **Silent fallback**: an unavailable GPU routes to the CPU path
//! - **Deterministic cleanup**: source textures are destroyed on every exit path
//! - **Headless**: renders to an off-screen surface, no window needed
//!
//! ## Example
//!
//! ```rust,no_run
//! use hybrid_image_resize::{EngineConfig, ResizeEngine, ResizeRequest, SourceImage};
//!
//! # async fn example(png: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = ResizeEngine::new(EngineConfig::default())?;
//! let source = SourceImage::decode(png)?;
//!
//! let request = ResizeRequest::width(960).lossy(0.85);
//! let resized = engine.resize(&source, &request).await?;
//! assert!(resized.as_str().starts_with("data:image/jpeg;base64,"));
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod cpu;
pub mod encode;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod instrument;
pub mod request;
pub mod source;

/// Re-export error types for convenience
pub use error::{HasRecoverySuggestion, HasSeverity, Recoverable, ResizeError, ResizeResult};

pub use config::{EngineConfig, PowerPreference};
pub use encode::EncodedImage;
pub use engine::ResizeEngine;
pub use instrument::{BenchmarkSuite, PerformanceMetric};
pub use request::{Raster, ResizeRequest};
pub use source::SourceImage;

/// Re-export the planning types shared with the CPU scaler.
pub use resize_scale::plan::{AspectMode, ScalePlan, Size};
