//! Image exporters for cropped regions
//!
//! Write an extracted region back to disk as 8-bit PNG or 16-bit TIFF.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

use crate::decoders::DecodedImage;
use crate::error::{LfaError, Result};

/// Output formats for exported regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Tiff16,
}

impl ExportFormat {
    /// Pick a format from the output path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| LfaError::Export(format!("no file extension: {}", path.display())))?;
        extension.parse()
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Tiff16 => "tif",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = LfaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "tif" | "tiff" | "tiff16" => Ok(ExportFormat::Tiff16),
            other => Err(LfaError::Export(format!(
                "unsupported export format: {}",
                other
            ))),
        }
    }
}

/// Export `image` to `path`, choosing the format from its extension.
pub fn export_image<P: AsRef<Path>>(image: &DecodedImage, path: P) -> Result<()> {
    let path = path.as_ref();
    match ExportFormat::from_path(path)? {
        ExportFormat::Png => export_png(image, path),
        ExportFormat::Tiff16 => export_tiff16(image, path),
    }
}

/// Export an RGB image as 8-bit PNG.
pub fn export_png<P: AsRef<Path>>(image: &DecodedImage, path: P) -> Result<()> {
    check_rgb(image)?;

    let file = File::create(path.as_ref())
        .map_err(|e| LfaError::Export(format!("Failed to create PNG file: {}", e)))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| LfaError::Export(format!("Failed to write PNG header: {}", e)))?;

    let bytes: Vec<u8> = image
        .data
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    writer
        .write_image_data(&bytes)
        .map_err(|e| LfaError::Export(format!("Failed to write PNG image: {}", e)))?;

    log::debug!(
        "exported {}x{} PNG to {}",
        image.width,
        image.height,
        path.as_ref().display()
    );
    Ok(())
}

/// Export an RGB image as 16-bit TIFF.
///
/// Grayscale sources are written as single-channel Gray16 using the first channel.
pub fn export_tiff16<P: AsRef<Path>>(image: &DecodedImage, path: P) -> Result<()> {
    check_rgb(image)?;

    let file = File::create(path.as_ref())
        .map_err(|e| LfaError::Export(format!("Failed to create TIFF file: {}", e)))?;
    let writer = BufWriter::new(file);

    let mut encoder = tiff::encoder::TiffEncoder::new(writer)
        .map_err(|e| LfaError::Export(format!("Failed to create TIFF encoder: {}", e)))?;

    let to_u16 = |v: f32| (v.clamp(0.0, 1.0) * 65535.0).round() as u16;

    if image.source_is_grayscale {
        let gray: Vec<u16> = image.data.chunks_exact(3).map(|p| to_u16(p[0])).collect();
        encoder
            .write_image::<tiff::encoder::colortype::Gray16>(image.width, image.height, &gray)
            .map_err(|e| LfaError::Export(format!("Failed to write grayscale TIFF image: {}", e)))?;
    } else {
        let rgb: Vec<u16> = image.data.iter().map(|&v| to_u16(v)).collect();
        encoder
            .write_image::<tiff::encoder::colortype::RGB16>(image.width, image.height, &rgb)
            .map_err(|e| LfaError::Export(format!("Failed to write TIFF image: {}", e)))?;
    }

    log::debug!(
        "exported {}x{} TIFF to {}",
        image.width,
        image.height,
        path.as_ref().display()
    );
    Ok(())
}

fn check_rgb(image: &DecodedImage) -> Result<()> {
    if image.channels != 3 {
        return Err(LfaError::Export(format!(
            "export only supports 3-channel RGB, got {} channels",
            image.channels
        )));
    }
    if image.width == 0 || image.height == 0 {
        return Err(LfaError::Export("cannot export an empty image".to_string()));
    }
    Ok(())
}
