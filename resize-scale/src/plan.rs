// SPDX-License-Identifier: MIT
//! # Destination Size Planning
//!
//! This module turns a caller's requested width/height into concrete output
//! dimensions. Both the GPU and CPU resize paths plan through [`build_plan`],
//! which is what guarantees they produce identically sized images.
//!
//! ## Aspect Policy
//!
//! - **Preserve** with one side requested: the other side is derived from the
//!   source ratio `w / h` and rounded to the nearest integer.
//! - **Preserve** with both sides requested: the image is fitted inside the
//!   requested box (upscaling allowed), so the ratio is kept.
//! - **Distort** with both sides requested: the requested size is used as-is.
//! - **Distort** with one side requested: the missing side keeps the source value.
//!
//! Every computed side is clamped to at least 1px.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// Number of pixels covered by this size.
    pub fn pixel_count(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Width over height as a float.
    pub fn aspect_ratio(&self) -> f64 {
        self.w as f64 / self.h as f64
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Defines how aspect ratio differences are handled during scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AspectMode {
    /// Keep the source aspect ratio; missing or conflicting sides are derived.
    Preserve,
    /// Use the requested sides verbatim, stretching or squeezing the content.
    Distort,
}

/// The caller's requested output sides. Either may be absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScaleTarget {
    pub w: Option<u32>,
    pub h: Option<u32>,
}

impl ScaleTarget {
    /// Request only a width.
    pub const fn width(w: u32) -> Self {
        Self { w: Some(w), h: None }
    }

    /// Request only a height.
    pub const fn height(h: u32) -> Self {
        Self { w: None, h: Some(h) }
    }

    /// Request both sides.
    pub const fn exact(w: u32, h: u32) -> Self {
        Self {
            w: Some(w),
            h: Some(h),
        }
    }
}

/// Complete scaling plan computed from input parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Requested sides used for planning
    pub target: ScaleTarget,
    /// Aspect ratio handling strategy
    pub aspect: AspectMode,
    /// Final computed output dimensions
    pub out: Size,
}

impl ScalePlan {
    /// True when the output is larger than the input on either side.
    pub fn is_upscale(&self) -> bool {
        self.out.w > self.input.w || self.out.h > self.input.h
    }
}

/// Reasons a plan cannot be built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// Neither width nor height was requested.
    NoDimension,
    /// A requested side was zero.
    ZeroDimension,
    /// The source image has a zero side.
    EmptySource,
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanError::NoDimension => write!(f, "at least one of width or height must be set"),
            PlanError::ZeroDimension => write!(f, "requested dimensions must be greater than 0"),
            PlanError::EmptySource => write!(f, "source image has a zero dimension"),
        }
    }
}

impl std::error::Error for PlanError {}

/// Compute a complete scaling plan from input parameters.
///
/// # Arguments
/// * `input` - Source image dimensions
/// * `target` - Requested output sides
/// * `aspect` - How to handle aspect ratio differences
///
/// # Errors
/// Returns [`PlanError`] when no side is requested, a requested side is zero,
/// or the source is empty.
pub fn build_plan(input: Size, target: ScaleTarget, aspect: AspectMode) -> Result<ScalePlan, PlanError> {
    if input.w == 0 || input.h == 0 {
        return Err(PlanError::EmptySource);
    }
    if target.w == Some(0) || target.h == Some(0) {
        return Err(PlanError::ZeroDimension);
    }

    let (w, h) = match (target.w, target.h, aspect) {
        (None, None, _) => return Err(PlanError::NoDimension),
        (Some(w), Some(h), AspectMode::Distort) => (w, h),
        (Some(w), Some(h), AspectMode::Preserve) => fit_within(input, Size { w, h }),
        (Some(w), None, AspectMode::Preserve) => (w, derive_height(input, w)),
        (None, Some(h), AspectMode::Preserve) => (derive_width(input, h), h),
        (Some(w), None, AspectMode::Distort) => (w, input.h),
        (None, Some(h), AspectMode::Distort) => (input.w, h),
    };

    Ok(ScalePlan {
        input,
        target,
        aspect,
        out: Size { w, h },
    })
}

/// Height for a given width at the source ratio: `round(w / (sw / sh))`.
fn derive_height(input: Size, w: u32) -> u32 {
    ((w as f64 / input.aspect_ratio()).round() as u32).max(1)
}

/// Width for a given height at the source ratio: `round(h * (sw / sh))`.
fn derive_width(input: Size, h: u32) -> u32 {
    ((h as f64 * input.aspect_ratio()).round() as u32).max(1)
}

/// Fit image within a bounding box while preserving aspect ratio.
///
/// Unlike a thumbnailer this may upscale: the box is the requested output.
fn fit_within(input: Size, box_: Size) -> (u32, u32) {
    let (w, h) = (input.w as f64, input.h as f64);
    let (bw, bh) = (box_.w as f64, box_.h as f64);
    let s = (bw / w).min(bh / h);
    (
        ((w * s).round() as u32).clamp(1, box_.w),
        ((h * s).round() as u32).clamp(1, box_.h),
    )
}
