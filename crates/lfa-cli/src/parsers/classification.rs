//! Parsing functions for classification inputs.

use lfa_core::ConcentrationLabel;

/// Parse raw scores in format "s0,s1,s2,s3"
///
/// The count is not checked here; the classification session reports a
/// mismatch against the label set.
pub fn parse_scores(scores_str: &str) -> Result<Vec<f64>, String> {
    scores_str
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid score: {}", part))
        })
        .collect()
}

/// Parse a concentration label name such as "10_Nanogram" (case-insensitive)
pub fn parse_label(label_str: &str) -> Result<ConcentrationLabel, String> {
    label_str.parse::<ConcentrationLabel>().map_err(|_| {
        let known: Vec<&str> = ConcentrationLabel::ALL.iter().map(|l| l.name()).collect();
        format!(
            "Unknown class '{}' (expected one of: {})",
            label_str,
            known.join(", ")
        )
    })
}

/// Parse a confidence floor between 0.0 and 1.0
pub fn parse_floor(floor_str: &str) -> Result<f64, String> {
    let floor = floor_str
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid confidence floor: {}", floor_str))?;
    if !(0.0..=1.0).contains(&floor) {
        return Err(format!(
            "Confidence floor {} must be in range [0.0, 1.0]",
            floor
        ));
    }
    Ok(floor)
}
