// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// RGBA8 in → RGBA8 out, direct write into caller-provided dst buffer.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::plan::{ScalePlan, Size};

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall { needed: usize, actual: usize },
    SourceMismatch { expected: usize, actual: usize },
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall { needed, actual } => {
                write!(f, "Output buffer too small: need {} bytes, got {}", needed, actual)
            }
            ScaleError::SourceMismatch { expected, actual } => {
                write!(f, "Source buffer is {} bytes, expected {}", actual, expected)
            }
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Resampling quality for the CPU path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Smoothing {
    /// Lanczos3 convolution. Matches a canvas with high-quality smoothing.
    #[default]
    High,
    /// Bilinear convolution, for when speed matters more than sharpness.
    Fast,
}

impl Smoothing {
    fn resize_alg(self) -> ResizeAlg {
        match self {
            Smoothing::High => ResizeAlg::Convolution(FilterType::Lanczos3),
            Smoothing::Fast => ResizeAlg::Convolution(FilterType::Bilinear),
        }
    }
}

/// Main scaling entry point.
///
/// `src_rgba` must be tightly packed `src.w * src.h * 4` bytes.
/// `dst` must hold at least `plan.out.w * plan.out.h * 4` bytes (RGBA).
pub fn scale_rgba_cpu(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    src: Size,
    plan: &ScalePlan,
    dst: &mut [u8],
    smoothing: Smoothing,
) -> Result<(), ScaleError> {
    let src_len = (src.w as usize) * (src.h as usize) * 4;
    if src_rgba.len() != src_len {
        return Err(ScaleError::SourceMismatch { expected: src_len, actual: src_rgba.len() });
    }
    let dst_len = (plan.out.w as usize) * (plan.out.h as usize) * 4;
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall { needed: dst_len, actual: dst.len() });
    }

    let src_view = TypedImageRef::<U8x4>::from_buffer(src.w, src.h, src_rgba)?;
    let mut dst_image = TypedImage::<U8x4>::from_buffer(plan.out.w, plan.out.h, &mut dst[..dst_len])?;

    let opts = ResizeOptions::new().resize_alg(smoothing.resize_alg());
    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;

    Ok(())
}
