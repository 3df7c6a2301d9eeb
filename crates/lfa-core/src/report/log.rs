//! Batch analysis log
//!
//! One row per analysed image, with the operator's ground truth next to the
//! prediction. Exported as a CSV named after the export date.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{create_unique, push_record, OperatorAnnotations};
use crate::classification::ClassificationResult;
use crate::error::{LfaError, Result};
use crate::labels::{ConcentrationLabel, LABEL_COUNT};

/// CSV header of an exported log.
pub const LOG_HEADER: [&str; 10] = [
    "Image Name",
    "True Class",
    "Predicted Class",
    "Confidence Score",
    "Is Correct",
    "1_Microgram Probability",
    "100_Nanogram Probability",
    "10_Nanogram Probability",
    "1_Nanogram Probability",
    "Timestamp",
];

/// One analysed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisLogEntry {
    pub image_name: String,
    pub true_class: Option<ConcentrationLabel>,
    pub predicted_class: ConcentrationLabel,
    pub confidence: f64,
    pub probabilities: [f64; LABEL_COUNT],
    pub timestamp: DateTime<Utc>,
}

impl AnalysisLogEntry {
    pub fn from_result(
        image_name: impl Into<String>,
        result: &ClassificationResult,
        annotations: Option<&OperatorAnnotations>,
    ) -> Self {
        Self {
            image_name: image_name.into(),
            true_class: annotations.and_then(|a| a.true_class),
            predicted_class: result.label(),
            confidence: result.confidence(),
            probabilities: result.probabilities,
            timestamp: result.timestamp,
        }
    }

    /// `None` when no true class was given.
    pub fn is_correct(&self) -> Option<bool> {
        self.true_class.map(|t| t == self.predicted_class)
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.image_name.clone(),
            self.true_class
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            self.predicted_class.name().to_string(),
            format!("{:.4}", self.confidence),
            match self.is_correct() {
                Some(true) => "Yes".to_string(),
                Some(false) => "No".to_string(),
                None => String::new(),
            },
        ];
        fields.extend(self.probabilities.iter().map(|p| format!("{:.4}", p)));
        fields.push(self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true));
        fields
    }
}

/// Ordered, append-only list of analysed images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisLog {
    entries: Vec<AnalysisLogEntry>,
}

impl AnalysisLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: AnalysisLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AnalysisLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fraction of annotated entries whose prediction matched, if any were annotated.
    pub fn accuracy(&self) -> Option<f64> {
        let judged: Vec<bool> = self.entries.iter().filter_map(|e| e.is_correct()).collect();
        if judged.is_empty() {
            return None;
        }
        let correct = judged.iter().filter(|c| **c).count();
        Some(correct as f64 / judged.len() as f64)
    }

    /// Serialize the log as delimited text.
    pub fn to_delimited(&self, delimiter: char) -> Result<String> {
        if self.entries.is_empty() {
            return Err(LfaError::EmptyLog);
        }

        let mut out = String::new();
        push_record(&mut out, &LOG_HEADER, delimiter);
        for entry in &self.entries {
            let fields = entry.fields();
            let refs: Vec<&str> = fields.iter().map(String::as_str).collect();
            push_record(&mut out, &refs, delimiter);
        }
        Ok(out)
    }

    /// Write to `<dir>/lfa_analysis_<YYYY-MM-DD>.csv` using `date` for the name.
    ///
    /// A log already exported that day is kept; the new one gets a `_N` suffix.
    pub fn write_to_dir(&self, dir: &Path, delimiter: char, date: DateTime<Utc>) -> Result<PathBuf> {
        let contents = self.to_delimited(delimiter)?;
        fs::create_dir_all(dir)?;
        let (mut file, path) = create_unique(dir, &log_file_stem(date), "csv")?;
        file.write_all(contents.as_bytes())?;
        log::info!("wrote {} log entries to {}", self.len(), path.display());
        Ok(path)
    }
}

/// `lfa_analysis_<YYYY-MM-DD>.csv`
pub fn log_file_name(date: DateTime<Utc>) -> String {
    format!("{}.csv", log_file_stem(date))
}

fn log_file_stem(date: DateTime<Utc>) -> String {
    format!("lfa_analysis_{}", date.format("%Y-%m-%d"))
}
