//! Input file discovery.

use std::path::{Path, PathBuf};

use crate::decoders::is_supported_image;
use crate::error::{LfaError, Result};

/// Expand a list of inputs (files and directories) into a list of image files.
///
/// Directories are scanned for supported image files (.png, .tif, .tiff).
/// If `recursive` is true, subdirectories are also scanned.
pub fn expand_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            collect_images_from_dir(input, recursive, &mut files)?;
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(LfaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Path not found: {}", input.display()),
            )));
        }
    }

    // Sort for consistent ordering
    files.sort();
    Ok(files)
}

fn collect_images_from_dir(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() && recursive {
            collect_images_from_dir(&path, recursive, files)?;
        } else if path.is_file() && is_supported_image(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Images a training run learns from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingDataset {
    files: Vec<PathBuf>,
}

impl TrainingDataset {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    /// Discover images under `inputs`, always recursing into directories.
    pub fn discover(inputs: &[PathBuf]) -> Result<Self> {
        Ok(Self::new(expand_inputs(inputs, true)?))
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
