//! # Configuration Module
//!
//! Engine-wide settings shared by the library, the benchmark tool and tests.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `prefer_gpu` | `bool` | `true` | Try the GPU path first in [`ResizeEngine::resize`](crate::ResizeEngine::resize) |
//! | `fallback_to_cpu` | `bool` | `true` | Use the CPU path when the GPU is unavailable |
//! | `power_preference` | [`PowerPreference`] | `HighPerformance` | Adapter selection hint |
//! | `benchmark_iterations` | `u32` | 3 | Runs per method per benchmark scenario |
//!
//! ## Examples
//!
//! ```rust
//! use hybrid_image_resize::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert!(config.validate().is_ok());
//!
//! let cpu_only = EngineConfig { prefer_gpu: false, ..EngineConfig::default() };
//! assert!(!cpu_only.prefer_gpu);
//! ```

use crate::error::{ResizeError, ResizeResult};

/// Adapter selection hint passed to the device provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerPreference {
    /// Prefer a discrete or otherwise fastest adapter.
    #[default]
    HighPerformance,
    /// Prefer an integrated or otherwise power-saving adapter.
    LowPower,
}

/// Configuration structure for the resize engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Whether `resize` should try the GPU before the CPU.
    pub prefer_gpu: bool,

    /// Whether `resize` may silently fall back to the CPU when the GPU
    /// context cannot be acquired. Failures after acquisition are never
    /// masked.
    pub fallback_to_cpu: bool,

    /// Hint used when requesting the adapter.
    pub power_preference: PowerPreference,

    /// Number of timed runs per method in each benchmark scenario.
    /// Must be greater than 0.
    pub benchmark_iterations: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefer_gpu: true,
            fallback_to_cpu: true,
            power_preference: PowerPreference::HighPerformance,
            benchmark_iterations: 3,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with the specified parameters.
    pub fn new(
        prefer_gpu: bool,
        fallback_to_cpu: bool,
        power_preference: PowerPreference,
        benchmark_iterations: u32,
    ) -> Self {
        Self {
            prefer_gpu,
            fallback_to_cpu,
            power_preference,
            benchmark_iterations,
        }
    }

    /// Configuration that never touches the GPU.
    pub fn cpu_only() -> Self {
        Self {
            prefer_gpu: false,
            ..Self::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> ResizeResult<()> {
        if self.benchmark_iterations == 0 {
            return Err(ResizeError::invalid_request(
                "benchmark_iterations",
                "must be greater than 0",
                "0",
            ));
        }
        Ok(())
    }
}
