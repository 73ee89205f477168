//! Output encoding to self-describing data URIs.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::{ResizeError, ResizeResult};
use crate::request::Raster;

/// An encoded image as returned to the caller.
///
/// The empty value is the batch sentinel for a failed item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedImage {
    data_uri: String,
    width: u32,
    height: u32,
}

impl EncodedImage {
    /// The sentinel used for failed batch items.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data_uri.is_empty()
    }

    /// `data:<mime>;base64,<payload>`, or `""` for the sentinel.
    pub fn as_str(&self) -> &str {
        &self.data_uri
    }

    pub fn into_data_uri(self) -> String {
        self.data_uri
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// MIME type from the URI header, `None` for the sentinel.
    pub fn mime_type(&self) -> Option<&str> {
        self.data_uri
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime)
    }

    /// Decode the base64 payload back into the encoded file bytes.
    pub fn decode_payload(&self) -> ResizeResult<Vec<u8>> {
        let (_, payload) = self
            .data_uri
            .split_once(',')
            .ok_or_else(|| ResizeError::decode("encoded image has no payload"))?;
        STANDARD
            .decode(payload)
            .map_err(|e| ResizeError::decode(format!("invalid base64 payload: {}", e)))
    }
}

impl std::fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.data_uri)
    }
}

/// Encode `image` as `format` and wrap it in a data URI.
pub fn encode(image: &RgbaImage, format: Raster) -> ResizeResult<EncodedImage> {
    let mime = format.mime_type();
    let mut bytes = Cursor::new(Vec::new());

    match format {
        Raster::Lossless => {
            PngEncoder::new(&mut bytes)
                .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
                .map_err(|e| ResizeError::encoder(mime, e))?;
        }
        Raster::Lossy { quality } => {
            let quality = jpeg_quality(quality)
                .ok_or_else(|| ResizeError::encoding(mime, format!("quality must be within 0..=1, got {}", quality)))?;
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality)
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                .map_err(|e| ResizeError::encoder(mime, e))?;
        }
    }

    Ok(EncodedImage {
        data_uri: format!("data:{};base64,{}", mime, STANDARD.encode(bytes.into_inner())),
        width: image.width(),
        height: image.height(),
    })
}

/// Map `0.0..=1.0` to the encoder's `1..=100`.
fn jpeg_quality(quality: f32) -> Option<u8> {
    if !(0.0..=1.0).contains(&quality) {
        return None;
    }
    Some(((quality * 100.0).round() as u8).max(1))
}
