//! Source images handed in by the caller.
//!
//! [`SourceImage`] is read-only to the engine. The GPU path turns it into a
//! [`Bitmap`] (a tightly packed RGBA8 copy owned by the operation) right before
//! upload and drops the bitmap once the texture is gone.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, RgbaImage};
use resize_scale::plan::Size;

use crate::error::{ResizeError, ResizeResult};

/// A decoded RGBA raster with known dimensions.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    /// Wrap an already decoded RGBA image.
    pub fn from_rgba(image: RgbaImage) -> ResizeResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ResizeError::decode(format!(
                "source has a zero dimension ({}x{})",
                image.width(),
                image.height()
            )));
        }
        Ok(Self {
            pixels: Arc::new(image),
        })
    }

    /// For generated images whose dimensions are known to be non-zero.
    pub(crate) fn from_nonempty(image: RgbaImage) -> Self {
        debug_assert!(image.width() > 0 && image.height() > 0);
        Self {
            pixels: Arc::new(image),
        }
    }

    /// Convert any decoded image to RGBA8.
    pub fn from_dynamic(image: DynamicImage) -> ResizeResult<Self> {
        Self::from_rgba(image.into_rgba8())
    }

    /// Decode an encoded payload (PNG, JPEG, ...), sniffing the format.
    pub fn decode(bytes: &[u8]) -> ResizeResult<Self> {
        let image = image::load_from_memory(bytes)?;
        Self::from_dynamic(image)
    }

    /// Decode a `data:<mime>;base64,<payload>` URI as produced by a file input.
    pub fn from_data_uri(uri: &str) -> ResizeResult<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ResizeError::decode("data URI must start with 'data:'"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ResizeError::decode("data URI has no payload separator"))?;
        if !header.ends_with(";base64") {
            return Err(ResizeError::decode("only base64 data URIs are supported"));
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| ResizeError::decode(format!("invalid base64 payload: {}", e)))?;
        Self::decode(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Borrow the pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Copy the pixels into a bitmap owned by one GPU operation.
    pub fn to_bitmap(&self) -> Bitmap {
        Bitmap {
            size: self.size(),
            rgba: self.pixels.as_raw().clone(),
        }
    }
}

/// Tightly packed RGBA8 pixels ready for texture upload.
#[derive(Debug)]
pub struct Bitmap {
    size: Size,
    rgba: Vec<u8>,
}

impl Bitmap {
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.w
    }

    pub fn height(&self) -> u32 {
        self.size.h
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgba
    }

    /// Bytes per row without padding.
    pub fn row_bytes(&self) -> u32 {
        self.size.w * 4
    }
}
