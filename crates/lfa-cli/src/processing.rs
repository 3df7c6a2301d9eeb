//! Input and output path handling shared by the commands.

use std::path::{Path, PathBuf};

use lfa_core::config::config_handle;
use lfa_core::{ConcentrationLabel, FixedScoresEngine, OperatorAnnotations};

/// Determine where a cropped region is written.
///
/// `out` may be a directory (file named after the input) or a file path.
/// Without `out`, the crop is written next to the input.
pub fn determine_output_path(input: &Path, out: &Option<PathBuf>, extension: &str) -> Result<PathBuf, String> {
    let filename = input
        .file_stem()
        .ok_or("Invalid input filename")?
        .to_string_lossy();
    let crop_name = format!("{}_crop.{}", filename, extension);

    match out {
        Some(out_path) if out_path.is_dir() => Ok(out_path.join(crop_name)),
        Some(out_path) => Ok(out_path.clone()),
        None => {
            let parent = input.parent().unwrap_or(Path::new("."));
            Ok(parent.join(crop_name))
        }
    }
}

/// File name used to label an input in reports and logs.
pub fn image_name(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

/// Build the stand-in inference engine from `--scores` / `--label` / `--model`.
///
/// Falls back to the reference scores and the configured model identifier.
pub fn build_engine(
    scores: Option<Vec<f64>>,
    label: Option<usize>,
    model: Option<String>,
) -> FixedScoresEngine {
    let model =
        model.unwrap_or_else(|| config_handle().config.classification.model_identifier.clone());
    let scores = scores.unwrap_or_else(|| lfa_core::classification::REFERENCE_SCORES.to_vec());
    let engine = FixedScoresEngine::new(scores, model);
    match label {
        Some(index) => engine.with_label(index),
        None => engine,
    }
}

/// Operator annotations from the `--true-*` options, if any were given.
pub fn build_annotations(
    true_class: Option<ConcentrationLabel>,
    true_bacterial_count: Option<String>,
    true_cell_count: Option<String>,
) -> Option<OperatorAnnotations> {
    let annotations = OperatorAnnotations {
        true_class,
        true_bacterial_count,
        true_cell_count,
    };
    (!annotations.is_empty()).then_some(annotations)
}

/// Directory reports go to: `--out` if given, else the configured one.
pub fn report_dir(out: &Option<PathBuf>) -> PathBuf {
    out.clone()
        .unwrap_or_else(|| config_handle().config.report.output_dir.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_output_path_next_to_input() {
        let path = determine_output_path(Path::new("/data/strip_01.png"), &None, "png").unwrap();
        assert_eq!(path, PathBuf::from("/data/strip_01_crop.png"));
    }

    #[test]
    fn test_output_path_in_directory() {
        let dir = tempdir().unwrap();
        let path = determine_output_path(
            Path::new("strip_01.tif"),
            &Some(dir.path().to_path_buf()),
            "tif",
        )
        .unwrap();
        assert_eq!(path, dir.path().join("strip_01_crop.tif"));
    }

    #[test]
    fn test_output_path_explicit_file() {
        let out = Some(PathBuf::from("/tmp/custom.png"));
        let path = determine_output_path(Path::new("strip.png"), &out, "png").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom.png"));
    }

    #[test]
    fn test_annotations_only_when_given() {
        assert!(build_annotations(None, None, None).is_none());
        let annotations =
            build_annotations(None, Some("1200".to_string()), None).unwrap();
        assert_eq!(annotations.true_bacterial_count.as_deref(), Some("1200"));
    }

    #[test]
    fn test_image_name_uses_file_name() {
        assert_eq!(image_name(Path::new("/data/run1/strip.png")), "strip.png");
    }
}
