//! Score normalization and the confidence floor transformation
//!
//! Raw inference scores are divided by their sum so they form a probability
//! distribution. When a confidence floor is configured, the predicted label's
//! probability is raised to at least the floor and the remaining labels are
//! rescaled so the distribution still sums to one. The floor changes what is
//! displayed; it is recorded on every result it touches.

use serde::{Deserialize, Serialize};

use crate::error::{LfaError, Result};
use crate::labels::LABEL_COUNT;

/// How the remaining probability mass is redistributed after the floor is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorMethod {
    /// Scale the other labels in proportion to their normalized probabilities
    #[default]
    Proportional,
    /// Spread the remainder equally over the other labels
    Uniform,
}

impl std::str::FromStr for FloorMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proportional" => Ok(Self::Proportional),
            "uniform" => Ok(Self::Uniform),
            other => Err(format!(
                "unknown floor method '{}' (expected proportional or uniform)",
                other
            )),
        }
    }
}

/// Confidence floor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidencePolicy {
    /// Minimum displayed probability for the predicted label; `None` disables the floor
    pub floor: Option<f64>,
    pub method: FloorMethod,
}

impl ConfidencePolicy {
    pub fn with_floor(floor: f64, method: FloorMethod) -> Self {
        Self {
            floor: Some(floor.clamp(0.0, 1.0)),
            method,
        }
    }
}

/// Normalize raw scores to sum to 1.0.
///
/// Rejects vectors of the wrong length, negative or non-finite entries, and
/// vectors whose sum is zero.
pub fn normalize_scores(scores: &[f64]) -> Result<[f64; LABEL_COUNT]> {
    if scores.len() != LABEL_COUNT {
        return Err(LfaError::LabelCountMismatch {
            expected: LABEL_COUNT,
            actual: scores.len(),
        });
    }
    if scores.iter().any(|s| !s.is_finite() || *s < 0.0) {
        return Err(LfaError::DegenerateScores(scores.to_vec()));
    }

    let max = scores.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return Err(LfaError::DegenerateScores(scores.to_vec()));
    }

    // scale by the max first so the sum stays finite for huge scores
    let mut probabilities = [0.0; LABEL_COUNT];
    for (p, s) in probabilities.iter_mut().zip(scores) {
        *p = s / max;
    }
    let sum: f64 = probabilities.iter().sum();
    for p in probabilities.iter_mut() {
        *p /= sum;
    }
    Ok(probabilities)
}

/// Raise `probabilities[predicted]` to at least `floor`, rescaling the rest.
///
/// Returns `true` when the distribution was changed.
pub fn apply_confidence_floor(
    probabilities: &mut [f64; LABEL_COUNT],
    predicted: usize,
    floor: f64,
    method: FloorMethod,
) -> bool {
    let floor = floor.clamp(0.0, 1.0);
    if predicted >= LABEL_COUNT || probabilities[predicted] >= floor {
        return false;
    }

    let others_mass = 1.0 - probabilities[predicted];
    let remainder = 1.0 - floor;

    for (i, p) in probabilities.iter_mut().enumerate() {
        if i == predicted {
            *p = floor;
            continue;
        }
        *p = match method {
            // others_mass > 0 because probabilities[predicted] < floor <= 1
            FloorMethod::Proportional => *p * remainder / others_mass,
            FloorMethod::Uniform => remainder / (LABEL_COUNT - 1) as f64,
        };
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }

    #[test]
    fn test_normalize_equal_scores() {
        let p = normalize_scores(&[0.1, 0.1, 0.1, 0.1]).unwrap();
        for v in p {
            assert_close(v, 0.25);
        }
    }

    #[test]
    fn test_floor_boosts_predicted_and_rescales_rest() {
        let mut p = normalize_scores(&[0.1, 0.1, 0.1, 0.1]).unwrap();
        let changed = apply_confidence_floor(&mut p, 1, 0.6, FloorMethod::Proportional);

        assert!(changed);
        assert_close(p[0], 0.1333);
        assert_close(p[1], 0.6);
        assert_close(p[2], 0.1333);
        assert_close(p[3], 0.1333);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_floor_proportional_keeps_ratios() {
        let mut p = normalize_scores(&[0.4, 0.3, 0.2, 0.1]).unwrap();
        apply_confidence_floor(&mut p, 1, 0.7, FloorMethod::Proportional);
        assert_close(p[0] / p[2], 2.0);
        assert_close(p[2] / p[3], 2.0);
    }

    #[test]
    fn test_floor_uniform_spreads_remainder() {
        let mut p = normalize_scores(&[0.4, 0.3, 0.2, 0.1]).unwrap();
        apply_confidence_floor(&mut p, 3, 0.7, FloorMethod::Uniform);
        assert_close(p[3], 0.7);
        for v in &p[..3] {
            assert_close(*v, 0.1);
        }
    }

    #[test]
    fn test_floor_noop_when_already_confident() {
        let mut p = normalize_scores(&[0.05, 0.87, 0.06, 0.02]).unwrap();
        let before = p;
        assert!(!apply_confidence_floor(&mut p, 1, 0.6, FloorMethod::Proportional));
        assert_eq!(p, before);
    }

    #[test]
    fn test_floor_of_one_zeroes_others() {
        let mut p = normalize_scores(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        apply_confidence_floor(&mut p, 0, 1.0, FloorMethod::Proportional);
        assert_eq!(p, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    #[allow(overflowing_literals)]
    fn test_huge_scores_do_not_overflow() {
        let p = normalize_scores(&[f64::MAX; 4]).unwrap();
        for v in p {
            assert_close(v, 0.25);
        }

        let p = normalize_scores(&[1e308, 3e308, 0.0, 0.0]).unwrap();
        assert_close(p[0], 0.25);
        assert_close(p[1], 0.75);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_scores_are_degenerate() {
        assert!(matches!(
            normalize_scores(&[0.0, 0.0, 0.0, 0.0]),
            Err(LfaError::DegenerateScores(_))
        ));
    }

    #[test]
    fn test_negative_or_nan_scores_are_degenerate() {
        assert!(normalize_scores(&[0.5, -0.1, 0.3, 0.3]).is_err());
        assert!(normalize_scores(&[0.5, f64::NAN, 0.3, 0.3]).is_err());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = normalize_scores(&[0.5, 0.5, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            LfaError::LabelCountMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_floor_method_parse() {
        assert_eq!("Uniform".parse::<FloorMethod>().unwrap(), FloorMethod::Uniform);
        assert!("softmax".parse::<FloorMethod>().is_err());
    }

    proptest! {
        #[test]
        fn prop_normalized_sums_to_one_and_respects_floor(
            scores in proptest::collection::vec(
                prop_oneof![0.0f64..100.0, 0.0f64..f64::MAX / 2.0],
                LABEL_COUNT,
            ),
            bump in 0usize..LABEL_COUNT,
            predicted in 0usize..LABEL_COUNT,
            floor in 0.0f64..=1.0,
            uniform in any::<bool>(),
        ) {
            let mut scores = scores;
            // guarantee at least one positive entry
            scores[bump] += 0.5;

            let method = if uniform { FloorMethod::Uniform } else { FloorMethod::Proportional };
            let mut p = normalize_scores(&scores).unwrap();
            apply_confidence_floor(&mut p, predicted, floor, method);

            prop_assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-6);
            prop_assert!(p[predicted] >= floor - 1e-12);
            prop_assert!(p.iter().all(|v| (0.0..=1.0 + 1e-12).contains(v)));
        }
    }
}
