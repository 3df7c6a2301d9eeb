//! PNG image decoder

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{expand_to_rgb, DecodedImage};
use crate::error::{LfaError, Result};

/// Decode a PNG file
///
/// Palette and sub-byte images are expanded to 8-bit by the decoder; 16-bit
/// samples are kept at full precision.
pub(crate) fn decode_png<P: AsRef<Path>>(path: P) -> Result<DecodedImage> {
    let file = File::open(path.as_ref())?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND);

    let mut reader = decoder
        .read_info()
        .map_err(|e| LfaError::Decode(format!("failed to read PNG info: {}", e)))?;

    let buffer_size = reader
        .output_buffer_size()
        .ok_or_else(|| LfaError::Decode("failed to determine PNG buffer size".to_string()))?;
    let mut buf = vec![0u8; buffer_size];
    let frame_info = reader
        .next_frame(&mut buf)
        .map_err(|e| LfaError::Decode(format!("failed to read PNG frame: {}", e)))?;
    let bytes = &buf[..frame_info.buffer_size()];

    let (color_type, bit_depth) = reader.output_color_type();
    let channels = match color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => {
            return Err(LfaError::Decode(
                "indexed PNG was not expanded by the decoder".to_string(),
            ))
        }
    };

    let expected = frame_info.width as usize * frame_info.height as usize * channels;
    let data = match bit_depth {
        png::BitDepth::Eight => {
            check_len(bytes.len(), expected)?;
            expand_to_rgb(bytes.iter().map(|&v| v as f32 / 255.0), channels)
        }
        png::BitDepth::Sixteen => {
            check_len(bytes.len(), expected * 2)?;
            // PNG 16-bit is big-endian
            expand_to_rgb(
                bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]) as f32 / 65535.0),
                channels,
            )
        }
        other => {
            return Err(LfaError::Decode(format!(
                "unsupported PNG bit depth: {:?}",
                other
            )))
        }
    };

    let mut image = DecodedImage::new(frame_info.width, frame_info.height, 3, data)?;
    image.source_is_grayscale = matches!(
        color_type,
        png::ColorType::Grayscale | png::ColorType::GrayscaleAlpha
    );
    Ok(image)
}

fn check_len(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(LfaError::Decode(format!(
            "PNG buffer size mismatch: expected {}, got {}",
            expected, actual
        )));
    }
    Ok(())
}
