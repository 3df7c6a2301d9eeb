//! Report assembly and serialization
//!
//! A [`ReportDocument`] is a flat, ordered table of `(field, value)` rows
//! grouped into sections. Serializing it yields one delimited text document
//! with a fixed header row and an empty row between sections.

pub mod log;

#[cfg(test)]
mod tests;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::classification::ClassificationResult;
use crate::error::{LfaError, Result};
use crate::labels::{ConcentrationLabel, DerivedMetrics, COUNT_UNIT, LABEL_COUNT};

pub use self::log::{AnalysisLog, AnalysisLogEntry};

/// Header row written at the top of every document.
pub const REPORT_HEADER: [&str; 2] = ["Field", "Value"];

/// Ground truth entered by the operator alongside an image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorAnnotations {
    pub true_class: Option<ConcentrationLabel>,
    /// Free text as entered
    pub true_bacterial_count: Option<String>,
    /// Free text as entered
    pub true_cell_count: Option<String>,
}

impl OperatorAnnotations {
    pub fn is_empty(&self) -> bool {
        self.true_class.is_none()
            && self.true_bacterial_count.is_none()
            && self.true_cell_count.is_none()
    }
}

/// Metadata that is not part of the classification result itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMetadata {
    /// Time the report was generated
    pub timestamp: DateTime<Utc>,
    pub image_name: Option<String>,
    pub annotations: Option<OperatorAnnotations>,
}

impl ReportMetadata {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            image_name: None,
            annotations: None,
        }
    }

    pub fn with_image_name(mut self, name: impl Into<String>) -> Self {
        self.image_name = Some(name.into());
        self
    }

    pub fn with_annotations(mut self, annotations: OperatorAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

/// One `(field, value)` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub field: String,
    pub value: String,
    /// Marks the row matching the predicted label
    pub highlighted: bool,
}

impl ReportRow {
    fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            highlighted: false,
        }
    }

    fn highlighted(mut self) -> Self {
        self.highlighted = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub rows: Vec<ReportRow>,
}

impl ReportSection {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }
}

/// Ordered, sectioned report table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    pub generated_at: String,
    pub sections: Vec<ReportSection>,
}

impl ReportDocument {
    /// Section by title.
    pub fn section(&self, title: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Serialize as delimited text.
    ///
    /// Fields containing the delimiter, a quote or a line break are quoted with
    /// embedded quotes doubled.
    pub fn to_delimited(&self, delimiter: char) -> String {
        let mut out = String::new();
        push_record(&mut out, &REPORT_HEADER, delimiter);

        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            push_record(&mut out, &[section.title.as_str(), ""], delimiter);
            for row in &section.rows {
                push_record(&mut out, &[row.field.as_str(), row.value.as_str()], delimiter);
            }
        }

        out
    }

    /// Write the document to `<dir>/lfa_report_<timestamp>.csv`.
    ///
    /// An existing file is never replaced; a `_N` suffix is added instead.
    pub fn write_to_dir(&self, dir: &Path, delimiter: char) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let (mut file, path) = create_unique(dir, &report_file_stem(&self.generated_at), "csv")?;
        file.write_all(self.to_delimited(delimiter).as_bytes())?;
        ::log::info!("wrote report to {}", path.display());
        Ok(path)
    }
}

/// Builds report documents from classification results.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportBuilder;

impl ReportBuilder {
    pub const SUMMARY: &'static str = "Summary";
    pub const CONFIDENCE: &'static str = "Confidence";
    pub const BACTERIAL_COUNT: &'static str = "Bacterial Count";
    pub const CELL_COUNT: &'static str = "Cell Count";
    pub const ANNOTATIONS: &'static str = "Operator Annotations";

    /// Assemble a report. Deterministic except for `metadata.timestamp`.
    pub fn build(
        result: &ClassificationResult,
        metrics: &[(ConcentrationLabel, DerivedMetrics); LABEL_COUNT],
        metadata: &ReportMetadata,
    ) -> ReportDocument {
        let predicted = result.label();
        let generated_at = metadata
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut summary = ReportSection::new(Self::SUMMARY);
        summary.push(ReportRow::new("Timestamp", generated_at.as_str()));
        if let Some(name) = &metadata.image_name {
            summary.push(ReportRow::new("Image", name.as_str()));
        }
        summary.push(ReportRow::new("Predicted Class", predicted.name()));
        summary.push(ReportRow::new(
            "Confidence",
            format_percent(result.confidence()),
        ));
        summary.push(ReportRow::new("Model", result.model_identifier.as_str()));
        summary.push(ReportRow::new(
            "Source Image",
            result.source_image.to_string(),
        ));
        summary.push(ReportRow::new(
            "Classified At",
            result.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
        if let Some(floor) = &result.floor_applied {
            summary.push(ReportRow::new(
                "Confidence Floor",
                format!(
                    "{} applied ({:?}); raw {}",
                    format_percent(floor.floor),
                    floor.method,
                    format_percent(floor.original_probability)
                ),
            ));
        }

        let mut confidence = ReportSection::new(Self::CONFIDENCE);
        for label in ConcentrationLabel::ALL {
            let row = ReportRow::new(label.name(), format_percent(result.probability_of(label)));
            confidence.push(if label == predicted { row.highlighted() } else { row });
        }

        let bacterial = count_section(Self::BACTERIAL_COUNT, metrics, predicted, |m| {
            m.bacterial_count
        });
        let cells = count_section(Self::CELL_COUNT, metrics, predicted, |m| m.cell_count);

        let mut sections = vec![summary, confidence, bacterial, cells];

        if let Some(annotations) = metadata.annotations.as_ref().filter(|a| !a.is_empty()) {
            sections.push(annotation_section(annotations, predicted));
        }

        ReportDocument {
            generated_at,
            sections,
        }
    }
}

fn count_section(
    title: &str,
    metrics: &[(ConcentrationLabel, DerivedMetrics); LABEL_COUNT],
    predicted: ConcentrationLabel,
    count: impl Fn(&DerivedMetrics) -> u64,
) -> ReportSection {
    let mut section = ReportSection::new(title);
    for (label, m) in metrics {
        let row = ReportRow::new(label.name(), format_count(count(m)));
        section.push(if *label == predicted { row.highlighted() } else { row });
    }
    if let Some((_, m)) = metrics.iter().find(|(label, _)| *label == predicted) {
        section.push(ReportRow::new("Predicted", format_count(count(m))).highlighted());
    }
    section
}

fn annotation_section(
    annotations: &OperatorAnnotations,
    predicted: ConcentrationLabel,
) -> ReportSection {
    let mut section = ReportSection::new(ReportBuilder::ANNOTATIONS);
    if let Some(true_class) = annotations.true_class {
        section.push(ReportRow::new("True Class", true_class.name()));
        section.push(ReportRow::new(
            "Is Correct",
            if true_class == predicted { "Yes" } else { "No" },
        ));
    }
    if let Some(count) = &annotations.true_bacterial_count {
        section.push(ReportRow::new("True Bacterial Count", count.as_str()));
    }
    if let Some(count) = &annotations.true_cell_count {
        section.push(ReportRow::new("True Cell Count", count.as_str()));
    }
    section
}

/// Probability as a percentage with two decimals.
pub fn format_percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

fn format_count(count: u64) -> String {
    format!("{} {}", count, COUNT_UNIT)
}

/// `lfa_report_<YYYYMMDDTHHMMSSmmmZ>` for an RFC 3339 timestamp.
fn report_file_stem(generated_at: &str) -> String {
    let compact: String = generated_at
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("lfa_report_{}", compact)
}

/// Most `_N` suffixes tried before giving up on a file name.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Create `<dir>/<stem>.<ext>`, or `<stem>_1.<ext>`, `<stem>_2.<ext>`, ... if
/// taken. Never opens an existing file.
pub(crate) fn create_unique(dir: &Path, stem: &str, ext: &str) -> Result<(File, PathBuf)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = match attempt {
            0 => format!("{}.{}", stem, ext),
            n => format!("{}_{}.{}", stem, n, ext),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(LfaError::Export(format!(
        "no free file name for {}.{} in {}",
        stem,
        ext,
        dir.display()
    )))
}

/// Quote a field if it contains the delimiter, a quote or a line break.
pub(crate) fn escape_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains(['"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub(crate) fn push_record(out: &mut String, fields: &[&str], delimiter: char) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        out.push_str(&escape_field(field, delimiter));
    }
    out.push('\n');
}
