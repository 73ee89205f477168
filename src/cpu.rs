//! CPU fallback resize.
//!
//! Uses the same dimension policy as the GPU path and a Lanczos3 resample,
//! the CPU counterpart of a canvas drawn with high-quality smoothing.

use fast_image_resize::Resizer;
use image::RgbaImage;
use resize_scale::cpu::{Smoothing, scale_rgba_cpu};
use resize_scale::plan::ScalePlan;

use crate::encode::{EncodedImage, encode};
use crate::error::{ResizeError, ResizeResult};
use crate::request::ResizeRequest;
use crate::source::SourceImage;

/// Resize on the CPU and encode the result.
///
/// Runs synchronously; it is `async` only to match the GPU entry point.
pub async fn resize_cpu(source: &SourceImage, request: &ResizeRequest) -> ResizeResult<EncodedImage> {
    request.validate()?;
    let plan = request.resolve(source.size())?;
    let pixels = scale_to_plan(source, &plan)?;
    encode(&pixels, request.format)
}

/// Draw `source` into a new surface of `plan.out` size.
pub fn scale_to_plan(source: &SourceImage, plan: &ScalePlan) -> ResizeResult<RgbaImage> {
    let mut surface = RgbaImage::new(plan.out.w, plan.out.h);
    scale_rgba_cpu(
        &mut Resizer::new(),
        source.pixels().as_raw(),
        source.size(),
        plan,
        &mut surface,
        Smoothing::High,
    )
    .map_err(|e| ResizeError::invalid_request("dimensions", e.to_string(), plan.out.to_string()))?;
    Ok(surface)
}
