//! Image decoders and the raster buffer shared by every component
//!
//! Support for PNG and TIFF strip photographs.

mod png;
mod tiff;


use std::path::Path;

use crate::error::{LfaError, Result};

/// Image extensions accepted as analysis or training input.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "tif", "tiff"];

/// Decoded image data
///
/// Pixels are stored row-major and interleaved, normalized to 0.0-1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Normalized sample data, `width * height * channels` long
    pub data: Vec<f32>,

    /// Number of channels (3 for RGB after decoding)
    pub channels: u8,

    /// Whether the source file was grayscale before expansion to RGB
    pub source_is_grayscale: bool,
}

impl DecodedImage {
    /// Build an image, checking that the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<f32>) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(LfaError::Decode(format!(
                "buffer size mismatch: expected {}, got {}",
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            channels,
            source_is_grayscale: false,
        })
    }

    /// Build an RGB image by evaluating `f` at every pixel.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [f32; 3],
    {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
            channels: 3,
            source_is_grayscale: false,
        }
    }

    /// Samples of one pixel, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels as usize;
        let start = (y as usize * self.width as usize + x as usize) * channels;
        self.data.get(start..start + channels)
    }

    /// Samples of one full row.
    pub fn row(&self, y: u32) -> Option<&[f32]> {
        if y >= self.height {
            return None;
        }
        let stride = self.width as usize * self.channels as usize;
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Decode an image from a file path
pub fn decode_image<P: AsRef<Path>>(path: P) -> Result<DecodedImage> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| LfaError::Decode(format!("no file extension: {}", path.display())))?;

    let image = match extension.as_str() {
        "tif" | "tiff" => tiff::decode_tiff(path)?,
        "png" => png::decode_png(path)?,
        _ => {
            return Err(LfaError::Decode(format!(
                "unsupported file format: {}",
                extension
            )))
        }
    };

    log::debug!(
        "decoded {} ({}x{}, {} channels)",
        path.display(),
        image.width,
        image.height,
        image.channels
    );
    Ok(image)
}

/// True when `path` has one of the supported image extensions.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand gray or RGBA sample buffers to interleaved RGB.
pub(crate) fn expand_to_rgb(
    samples: impl ExactSizeIterator<Item = f32>,
    source_channels: usize,
) -> Vec<f32> {
    let pixel_count = samples.len() / source_channels.max(1);
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut pixel = [0.0f32; 4];

    for (i, value) in samples.enumerate() {
        let c = i % source_channels;
        pixel[c] = value;
        if c + 1 == source_channels {
            match source_channels {
                1 | 2 => rgb.extend_from_slice(&[pixel[0], pixel[0], pixel[0]]),
                _ => rgb.extend_from_slice(&pixel[..3]),
            }
        }
    }

    rgb
}
