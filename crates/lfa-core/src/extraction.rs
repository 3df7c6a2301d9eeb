//! Region extraction
//!
//! Crops a committed selection out of a source image at 1:1 scale. No
//! resampling takes place; the output holds exactly the source pixels that
//! fall inside the selection after clamping to the image bounds.

use crate::decoders::DecodedImage;
use crate::error::{LfaError, Result};
use crate::selection::{PixelRect, SelectionRect};

/// Extract the pixels inside `rect` as a new standalone image.
///
/// Fails with [`LfaError::EmptySelection`] when the rectangle has zero width
/// or height, or when it does not overlap the image at all.
pub fn extract(image: &DecodedImage, rect: &SelectionRect) -> Result<DecodedImage> {
    if rect.is_empty() {
        return Err(LfaError::EmptySelection);
    }

    let pixels = rect.to_pixel_rect(image.width, image.height);
    extract_pixels(image, pixels)
}

/// Extract an integer pixel rectangle, clamped to the image bounds.
pub fn extract_pixels(image: &DecodedImage, rect: PixelRect) -> Result<DecodedImage> {
    let x = rect.x.min(image.width);
    let y = rect.y.min(image.height);
    let width = rect.width.min(image.width - x);
    let height = rect.height.min(image.height - y);

    if width == 0 || height == 0 {
        return Err(LfaError::EmptySelection);
    }

    let channels = image.channels as usize;
    let mut data = Vec::with_capacity(width as usize * height as usize * channels);

    for row in y..(y + height) {
        let row_start = (row as usize * image.width as usize + x as usize) * channels;
        let row_end = row_start + width as usize * channels;
        data.extend_from_slice(&image.data[row_start..row_end]);
    }

    log::debug!(
        "extracted region x={} y={} {}x{} from {}x{} image",
        x,
        y,
        width,
        height,
        image.width,
        image.height
    );

    Ok(DecodedImage {
        width,
        height,
        data,
        channels: image.channels,
        source_is_grayscale: image.source_is_grayscale,
    })
}
