//! TIFF image decoder

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};

use super::{expand_to_rgb, DecodedImage};
use crate::error::{LfaError, Result};

/// Decode a TIFF file
pub(crate) fn decode_tiff<P: AsRef<Path>>(path: P) -> Result<DecodedImage> {
    let file = File::open(path.as_ref())?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| LfaError::Decode(format!("failed to create TIFF decoder: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| LfaError::Decode(format!("failed to get TIFF dimensions: {}", e)))?;
    let color_type = decoder
        .colortype()
        .map_err(|e| LfaError::Decode(format!("failed to get TIFF color type: {}", e)))?;

    let channels = match color_type {
        tiff::ColorType::Gray(_) => 1,
        tiff::ColorType::GrayA(_) => 2,
        tiff::ColorType::RGB(_) => 3,
        tiff::ColorType::RGBA(_) => 4,
        other => {
            return Err(LfaError::Decode(format!(
                "unsupported TIFF color type: {:?}",
                other
            )))
        }
    };

    let image_data = decoder
        .read_image()
        .map_err(|e| LfaError::Decode(format!("failed to read TIFF image data: {}", e)))?;

    let expected = width as usize * height as usize * channels;
    let data = match image_data {
        DecodingResult::U8(buf) => {
            check_len(buf.len(), expected)?;
            expand_to_rgb(buf.iter().map(|&v| v as f32 / 255.0), channels)
        }
        DecodingResult::U16(buf) => {
            check_len(buf.len(), expected)?;
            expand_to_rgb(buf.iter().map(|&v| v as f32 / 65535.0), channels)
        }
        DecodingResult::F32(buf) => {
            check_len(buf.len(), expected)?;
            expand_to_rgb(buf.iter().copied(), channels)
        }
        DecodingResult::F64(buf) => {
            check_len(buf.len(), expected)?;
            expand_to_rgb(buf.iter().map(|&v| v as f32), channels)
        }
        _ => {
            return Err(LfaError::Decode(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    let mut image = DecodedImage::new(width, height, 3, data)?;
    image.source_is_grayscale = matches!(
        color_type,
        tiff::ColorType::Gray(_) | tiff::ColorType::GrayA(_)
    );
    Ok(image)
}

fn check_len(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(LfaError::Decode(format!(
            "TIFF buffer size mismatch: expected {}, got {}",
            expected, actual
        )));
    }
    Ok(())
}
