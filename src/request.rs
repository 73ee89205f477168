//! Resize requests and output formats.
//!
//! A [`ResizeRequest`] is what the settings form hands the engine. Dimension
//! resolution is shared by the GPU and CPU paths through
//! [`ResizeRequest::resolve`], so both always agree on the output size.

use resize_scale::plan::{AspectMode, ScalePlan, ScaleTarget, Size, build_plan};

use crate::error::{ResizeError, ResizeResult};

/// Largest output side. JPEG stores dimensions as 16-bit values.
pub const MAX_OUTPUT_SIDE: u32 = 65_535;

/// Largest output area in pixels (1 GiB of RGBA).
pub const MAX_OUTPUT_PIXELS: u64 = 1 << 28;

/// Output encoding. Closed set so encoders are matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Raster {
    /// PNG.
    #[default]
    Lossless,
    /// JPEG with quality in `0.0..=1.0`.
    Lossy { quality: f32 },
}

impl Raster {
    /// MIME type used in the data URI.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Raster::Lossless => "image/png",
            Raster::Lossy { .. } => "image/jpeg",
        }
    }
}

/// What to resize to and how to encode it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub preserve_aspect_ratio: bool,
    pub format: Raster,
}

impl Default for ResizeRequest {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            preserve_aspect_ratio: true,
            format: Raster::Lossless,
        }
    }
}

impl ResizeRequest {
    /// Width only; height follows the source ratio.
    pub fn width(width: u32) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    /// Height only; width follows the source ratio.
    pub fn height(height: u32) -> Self {
        Self {
            height: Some(height),
            ..Self::default()
        }
    }

    /// Exact size, ignoring the source ratio.
    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            preserve_aspect_ratio: false,
            format: Raster::Lossless,
        }
    }

    pub fn with_aspect_ratio(mut self, preserve: bool) -> Self {
        self.preserve_aspect_ratio = preserve;
        self
    }

    pub fn with_format(mut self, format: Raster) -> Self {
        self.format = format;
        self
    }

    /// Encode as JPEG at `quality`.
    pub fn lossy(self, quality: f32) -> Self {
        self.with_format(Raster::Lossy { quality })
    }

    /// Checks quality range and rejects zero sides. Whether the request
    /// resolves at all is decided by [`resolve`](Self::resolve).
    pub fn validate(&self) -> ResizeResult<()> {
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if value == Some(0) {
                return Err(ResizeError::invalid_request(field, "must be greater than 0", "0"));
            }
        }
        if let Raster::Lossy { quality } = self.format {
            if !(0.0..=1.0).contains(&quality) {
                return Err(ResizeError::encoding(
                    self.format.mime_type(),
                    format!("quality must be within 0..=1, got {}", quality),
                ));
            }
        }
        Ok(())
    }

    /// Compute the destination plan for a source of `source` size.
    ///
    /// Plans larger than [`MAX_OUTPUT_SIDE`] or [`MAX_OUTPUT_PIXELS`] are
    /// rejected before any surface is allocated.
    pub fn resolve(&self, source: Size) -> ResizeResult<ScalePlan> {
        let aspect = if self.preserve_aspect_ratio {
            AspectMode::Preserve
        } else {
            AspectMode::Distort
        };
        let target = ScaleTarget {
            w: self.width,
            h: self.height,
        };
        let plan = build_plan(source, target, aspect).map_err(|e| {
            ResizeError::invalid_request(
                "dimensions",
                e.to_string(),
                format!("{:?}x{:?} from {}", self.width, self.height, source),
            )
        })?;
        let out = plan.out;
        if out.w > MAX_OUTPUT_SIDE || out.h > MAX_OUTPUT_SIDE {
            return Err(ResizeError::invalid_request(
                "dimensions",
                format!("each side must be at most {}", MAX_OUTPUT_SIDE),
                out.to_string(),
            ));
        }
        if out.pixel_count() > MAX_OUTPUT_PIXELS {
            return Err(ResizeError::invalid_request(
                "dimensions",
                format!("output must cover at most {} pixels", MAX_OUTPUT_PIXELS),
                out.to_string(),
            ));
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_width_with_ratio() {
        let plan = ResizeRequest::width(960).resolve(Size::new(1920, 1080)).unwrap();
        assert_eq!(plan.out, Size::new(960, 540));
    }

    #[test]
    fn exact_ignores_ratio() {
        let plan = ResizeRequest::exact(512, 512).resolve(Size::new(256, 128)).unwrap();
        assert_eq!(plan.out, Size::new(512, 512));
    }

    #[test]
    fn unresolvable_request_is_invalid() {
        let err = ResizeRequest::default().resolve(Size::new(10, 10)).unwrap_err();
        assert_eq!(err.category(), "invalid_request");
    }

    #[test]
    fn oversized_output_is_invalid() {
        let source = Size::new(1920, 1080);
        let err = ResizeRequest::width(u32::MAX).resolve(source).unwrap_err();
        assert_eq!(err.category(), "invalid_request");

        // Each side fits but the area does not.
        let err = ResizeRequest::exact(MAX_OUTPUT_SIDE, MAX_OUTPUT_SIDE).resolve(source).unwrap_err();
        assert!(err.to_string().contains("pixels"));

        let plan = ResizeRequest::exact(MAX_OUTPUT_SIDE, 4).resolve(source).unwrap();
        assert_eq!(plan.out, Size::new(MAX_OUTPUT_SIDE, 4));
    }

    #[test]
    fn lossy_quality_is_range_checked() {
        assert!(ResizeRequest::width(10).lossy(0.85).validate().is_ok());
        assert!(ResizeRequest::width(10).lossy(1.5).validate().is_err());
        assert!(ResizeRequest::width(10).lossy(f32::NAN).validate().is_err());
    }

    #[test]
    fn zero_side_is_invalid() {
        let err = ResizeRequest::exact(10, 0).validate().unwrap_err();
        assert_eq!(err.category(), "invalid_request");
        assert!(err.to_string().contains("'height'"));
    }
}
