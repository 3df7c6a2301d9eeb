//! Concentration labels and their derived metrics
//!
//! The classifier distinguishes four analyte concentrations. Each maps to a
//! fixed bacterial count and cell count; the lookup depends only on the
//! label, never on model confidence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LfaError, Result};

/// Number of known labels.
pub const LABEL_COUNT: usize = 4;

/// Unit shared by both derived counts.
pub const COUNT_UNIT: &str = "cfu/ml";

/// Analyte concentration class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConcentrationLabel {
    #[serde(rename = "1_Microgram")]
    OneMicrogram,
    #[serde(rename = "100_Nanogram")]
    HundredNanogram,
    #[serde(rename = "10_Nanogram")]
    TenNanogram,
    #[serde(rename = "1_Nanogram")]
    OneNanogram,
}

impl ConcentrationLabel {
    /// All labels in model output order.
    pub const ALL: [ConcentrationLabel; LABEL_COUNT] = [
        ConcentrationLabel::OneMicrogram,
        ConcentrationLabel::HundredNanogram,
        ConcentrationLabel::TenNanogram,
        ConcentrationLabel::OneNanogram,
    ];

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(LfaError::UnknownLabel(index))
    }

    pub fn index(self) -> usize {
        match self {
            ConcentrationLabel::OneMicrogram => 0,
            ConcentrationLabel::HundredNanogram => 1,
            ConcentrationLabel::TenNanogram => 2,
            ConcentrationLabel::OneNanogram => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConcentrationLabel::OneMicrogram => "1_Microgram",
            ConcentrationLabel::HundredNanogram => "100_Nanogram",
            ConcentrationLabel::TenNanogram => "10_Nanogram",
            ConcentrationLabel::OneNanogram => "1_Nanogram",
        }
    }

    /// Derived metrics for this label.
    pub fn metrics(self) -> DerivedMetrics {
        METRICS_TABLE[self.index()]
    }
}

impl fmt::Display for ConcentrationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConcentrationLabel {
    type Err = LfaError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LfaError::UnknownLabelName(trimmed.to_string()))
    }
}

/// Counts looked up from a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Bacterial count (cfu/ml)
    pub bacterial_count: u64,
    /// Cell count (cfu/ml)
    pub cell_count: u64,
}

const METRICS_TABLE: [DerivedMetrics; LABEL_COUNT] = [
    DerivedMetrics {
        bacterial_count: 1_000_000,
        cell_count: 12_000,
    },
    DerivedMetrics {
        bacterial_count: 100_000,
        cell_count: 10_000,
    },
    DerivedMetrics {
        bacterial_count: 10_000,
        cell_count: 8_000,
    },
    DerivedMetrics {
        bacterial_count: 1_000,
        cell_count: 6_000,
    },
];

/// Look up the derived metrics for a label index.
pub fn derive_metrics(label_index: usize) -> Result<DerivedMetrics> {
    ConcentrationLabel::from_index(label_index).map(ConcentrationLabel::metrics)
}

/// Metrics for every label, in label order.
pub fn metrics_table() -> [(ConcentrationLabel, DerivedMetrics); LABEL_COUNT] {
    ConcentrationLabel::ALL.map(|label| (label, label.metrics()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_nanogram_metrics() {
        let label: ConcentrationLabel = "10_Nanogram".parse().unwrap();
        let metrics = derive_metrics(label.index()).unwrap();
        assert_eq!(metrics.bacterial_count, 10_000);
        assert_eq!(metrics.cell_count, 8_000);
    }

    #[test]
    fn test_derive_metrics_is_deterministic() {
        for index in 0..LABEL_COUNT {
            assert_eq!(derive_metrics(index).unwrap(), derive_metrics(index).unwrap());
        }
    }

    #[test]
    fn test_unknown_index_rejected() {
        assert!(matches!(derive_metrics(4), Err(LfaError::UnknownLabel(4))));
        assert!(matches!(
            ConcentrationLabel::from_index(usize::MAX),
            Err(LfaError::UnknownLabel(_))
        ));
    }

    #[test]
    fn test_index_round_trips_through_all() {
        for (i, label) in ConcentrationLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(ConcentrationLabel::from_index(i).unwrap(), *label);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "1_microgram".parse::<ConcentrationLabel>().unwrap(),
            ConcentrationLabel::OneMicrogram
        );
        assert!("5_Nanogram".parse::<ConcentrationLabel>().is_err());
    }

    #[test]
    fn test_counts_decrease_with_concentration() {
        let table = metrics_table();
        for pair in table.windows(2) {
            assert!(pair[0].1.bacterial_count > pair[1].1.bacterial_count);
            assert!(pair[0].1.cell_count > pair[1].1.cell_count);
        }
    }
}
