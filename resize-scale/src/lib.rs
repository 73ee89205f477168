// SPDX-License-Identifier: MIT
//! # resize-scale: Size Planning and CPU Scaling
//!
//! This crate holds the device-independent half of the hybrid image resizer:
//! deciding what size an output should be, and producing it on the CPU.
//!
//! ## Key Components
//!
//! - [`plan`]: Destination size computation (aspect-ratio policy)
//! - [`cpu`]: CPU-based scaling implementation using SIMD acceleration
//!
//! ## Usage Example
//!
//! ```rust
//! use resize_scale::cpu::{scale_rgba_cpu, Smoothing};
//! use resize_scale::plan::{build_plan, AspectMode, ScaleTarget, Size};
//!
//! let input_size = Size { w: 1920, h: 1080 };
//! let plan = build_plan(input_size, ScaleTarget::width(960), AspectMode::Preserve).unwrap();
//! assert_eq!((plan.out.w, plan.out.h), (960, 540));
//!
//! let input_rgba = vec![0u8; (input_size.w * input_size.h * 4) as usize];
//! let mut output = vec![0u8; (plan.out.w * plan.out.h * 4) as usize];
//! let mut resizer = fast_image_resize::Resizer::new();
//!
//! scale_rgba_cpu(&mut resizer, &input_rgba, input_size, &plan, &mut output, Smoothing::High).unwrap();
//! ```

pub mod cpu;
pub mod plan;
