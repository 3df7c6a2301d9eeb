//! Tests for report assembly and the analysis log

use chrono::{TimeZone, Utc};
use tempfile::tempdir;

use super::*;
use crate::classification::{AppliedFloor, FloorMethod, ImageVariant};
use crate::error::LfaError;
use crate::labels::metrics_table;

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 5).unwrap()
}

fn sample_result() -> ClassificationResult {
    ClassificationResult {
        label_index: 2,
        probabilities: [0.1, 0.2, 0.6, 0.1],
        source_image: ImageVariant::Cropped,
        model_identifier: "anti_overfitting_model.pth".to_string(),
        timestamp: fixed_time(),
        floor_applied: None,
    }
}

fn metadata() -> ReportMetadata {
    ReportMetadata {
        timestamp: fixed_time(),
        image_name: Some("strip_01.png".to_string()),
        annotations: None,
    }
}

// ========================================================================
// Report document
// ========================================================================

#[test]
fn test_sections_in_order() {
    let doc = ReportBuilder::build(&sample_result(), &metrics_table(), &metadata());
    let titles: Vec<&str> = doc.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            ReportBuilder::SUMMARY,
            ReportBuilder::CONFIDENCE,
            ReportBuilder::BACTERIAL_COUNT,
            ReportBuilder::CELL_COUNT,
        ]
    );
}

#[test]
fn test_confidence_rows_use_two_decimals() {
    let doc = ReportBuilder::build(&sample_result(), &metrics_table(), &metadata());
    let confidence = doc.section(ReportBuilder::CONFIDENCE).unwrap();

    assert_eq!(confidence.rows.len(), 4);
    assert_eq!(confidence.rows[2].field, "10_Nanogram");
    assert_eq!(confidence.rows[2].value, "60.00%");
    assert!(confidence.rows[2].highlighted);
    assert!(!confidence.rows[0].highlighted);
}

#[test]
fn test_count_sections_highlight_prediction() {
    let doc = ReportBuilder::build(&sample_result(), &metrics_table(), &metadata());

    let bacterial = doc.section(ReportBuilder::BACTERIAL_COUNT).unwrap();
    assert_eq!(bacterial.rows.len(), 5);
    let predicted = bacterial.rows.last().unwrap();
    assert_eq!(predicted.field, "Predicted");
    assert_eq!(predicted.value, "10000 cfu/ml");
    assert!(predicted.highlighted);

    let cells = doc.section(ReportBuilder::CELL_COUNT).unwrap();
    assert_eq!(cells.rows.last().unwrap().value, "8000 cfu/ml");
    assert_eq!(cells.rows[0].value, "12000 cfu/ml");
}

#[test]
fn test_build_is_deterministic_for_fixed_timestamp() {
    let a = ReportBuilder::build(&sample_result(), &metrics_table(), &metadata());
    let b = ReportBuilder::build(&sample_result(), &metrics_table(), &metadata());
    assert_eq!(a, b);
    assert_eq!(a.to_delimited(','), b.to_delimited(','));
}

#[test]
fn test_only_timestamp_varies_between_builds() {
    let later = ReportMetadata {
        timestamp: Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap(),
        ..metadata()
    };
    let a = ReportBuilder::build(&sample_result(), &metrics_table(), &metadata());
    let b = ReportBuilder::build(&sample_result(), &metrics_table(), &later);

    let differing: Vec<(&ReportRow, &ReportRow)> = a
        .sections
        .iter()
        .zip(&b.sections)
        .flat_map(|(sa, sb)| sa.rows.iter().zip(&sb.rows))
        .filter(|(ra, rb)| ra != rb)
        .collect();
    assert_eq!(differing.len(), 1);
    assert_eq!(differing[0].0.field, "Timestamp");
}

#[test]
fn test_delimited_layout() {
    let doc = ReportBuilder::build(&sample_result(), &metrics_table(), &metadata());
    let text = doc.to_delimited(',');
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "Field,Value");
    assert_eq!(lines[1], "Summary,");
    assert_eq!(lines[2], "Timestamp,2026-10-18T09:30:05.000Z");
    // one blank separator between each pair of sections
    assert_eq!(lines.iter().filter(|l| l.is_empty()).count(), 3);
    assert!(text.contains("\nConfidence,\n"));
}

#[test]
fn test_fields_with_delimiter_are_quoted() {
    let meta = metadata().with_image_name("strip, \"A\".png");
    let doc = ReportBuilder::build(&sample_result(), &metrics_table(), &meta);
    let text = doc.to_delimited(',');
    assert!(text.contains("Image,\"strip, \"\"A\"\".png\""));

    // a different delimiter leaves the comma alone
    let text = doc.to_delimited(';');
    assert!(text.contains("Image;\"strip, \"\"A\"\".png\""));
    assert!(text.contains("Model;anti_overfitting_model.pth"));
}

#[test]
fn test_confidence_floor_is_reported() {
    let mut result = sample_result();
    result.floor_applied = Some(AppliedFloor {
        floor: 0.6,
        method: FloorMethod::Proportional,
        original_probability: 0.25,
    });
    let doc = ReportBuilder::build(&result, &metrics_table(), &metadata());
    let summary = doc.section(ReportBuilder::SUMMARY).unwrap();
    let row = summary
        .rows
        .iter()
        .find(|r| r.field == "Confidence Floor")
        .unwrap();
    assert_eq!(row.value, "60.00% applied (Proportional); raw 25.00%");
}

#[test]
fn test_annotation_section_only_when_present() {
    let empty = metadata().with_annotations(OperatorAnnotations::default());
    let doc = ReportBuilder::build(&sample_result(), &metrics_table(), &empty);
    assert!(doc.section(ReportBuilder::ANNOTATIONS).is_none());

    let annotated = metadata().with_annotations(OperatorAnnotations {
        true_class: Some(ConcentrationLabel::OneNanogram),
        true_bacterial_count: Some("1200".to_string()),
        true_cell_count: None,
    });
    let doc = ReportBuilder::build(&sample_result(), &metrics_table(), &annotated);
    let section = doc.section(ReportBuilder::ANNOTATIONS).unwrap();
    assert_eq!(section.rows[0].value, "1_Nanogram");
    assert_eq!(section.rows[1].value, "No");
    assert_eq!(section.rows[2].value, "1200");
}

#[test]
fn test_write_report_uses_timestamped_name() {
    let dir = tempdir().unwrap();
    let doc = ReportBuilder::build(&sample_result(), &metrics_table(), &metadata());

    let path = doc.write_to_dir(dir.path(), ',').unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "lfa_report_20261018T093005000Z.csv"
    );
    assert_eq!(std::fs::read_to_string(&path).unwrap(), doc.to_delimited(','));
}

#[test]
fn test_reports_with_same_timestamp_both_kept() {
    let dir = tempdir().unwrap();
    let first = ReportBuilder::build(&sample_result(), &metrics_table(), &metadata());
    let second = ReportBuilder::build(
        &sample_result(),
        &metrics_table(),
        &metadata().with_image_name("strip_02.png"),
    );
    assert_eq!(first.generated_at, second.generated_at);

    let first_path = first.write_to_dir(dir.path(), ',').unwrap();
    let second_path = second.write_to_dir(dir.path(), ',').unwrap();

    assert_ne!(first_path, second_path);
    assert_eq!(
        second_path.file_name().unwrap().to_str().unwrap(),
        "lfa_report_20261018T093005000Z_1.csv"
    );
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    assert_eq!(
        std::fs::read_to_string(&first_path).unwrap(),
        first.to_delimited(',')
    );
    assert_eq!(
        std::fs::read_to_string(&second_path).unwrap(),
        second.to_delimited(',')
    );
}

#[test]
fn test_report_name_keeps_milliseconds() {
    let mut meta = metadata();
    meta.timestamp = fixed_time() + chrono::Duration::milliseconds(250);
    let doc = ReportBuilder::build(&sample_result(), &metrics_table(), &meta);

    let dir = tempdir().unwrap();
    let path = doc.write_to_dir(dir.path(), ',').unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "lfa_report_20261018T093005250Z.csv"
    );
}

// ========================================================================
// Analysis log
// ========================================================================

#[test]
fn test_empty_log_cannot_be_exported() {
    let dir = tempdir().unwrap();
    let log = AnalysisLog::new();
    assert!(matches!(log.to_delimited(','), Err(LfaError::EmptyLog)));
    assert!(matches!(
        log.write_to_dir(dir.path(), ',', fixed_time()),
        Err(LfaError::EmptyLog)
    ));
}

#[test]
fn test_log_rows_and_accuracy() {
    let mut log = AnalysisLog::new();
    let correct = OperatorAnnotations {
        true_class: Some(ConcentrationLabel::TenNanogram),
        ..OperatorAnnotations::default()
    };
    let wrong = OperatorAnnotations {
        true_class: Some(ConcentrationLabel::OneMicrogram),
        ..OperatorAnnotations::default()
    };
    log.push(AnalysisLogEntry::from_result("a.png", &sample_result(), Some(&correct)));
    log.push(AnalysisLogEntry::from_result("b.png", &sample_result(), Some(&wrong)));
    log.push(AnalysisLogEntry::from_result("c.png", &sample_result(), None));

    assert_eq!(log.accuracy(), Some(0.5));

    let text = log.to_delimited(',').unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], LOG_HEADER_LINE);
    assert_eq!(
        lines[1],
        "a.png,10_Nanogram,10_Nanogram,0.6000,Yes,0.1000,0.2000,0.6000,0.1000,2026-10-18T09:30:05Z"
    );
    assert!(lines[2].contains(",No,"));
    assert!(lines[3].starts_with("c.png,,10_Nanogram,0.6000,,"));
}

const LOG_HEADER_LINE: &str = "Image Name,True Class,Predicted Class,Confidence Score,Is Correct,\
1_Microgram Probability,100_Nanogram Probability,10_Nanogram Probability,1_Nanogram Probability,\
Timestamp";

#[test]
fn test_log_file_named_by_date() {
    let dir = tempdir().unwrap();
    let mut log = AnalysisLog::new();
    log.push(AnalysisLogEntry::from_result("a.png", &sample_result(), None));

    let path = log.write_to_dir(dir.path(), ',', fixed_time()).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "lfa_analysis_2026-10-18.csv"
    );
}

#[test]
fn test_second_log_same_day_does_not_overwrite() {
    let dir = tempdir().unwrap();
    let mut morning = AnalysisLog::new();
    morning.push(AnalysisLogEntry::from_result("a.png", &sample_result(), None));
    let mut evening = AnalysisLog::new();
    evening.push(AnalysisLogEntry::from_result("b.png", &sample_result(), None));

    let first = morning.write_to_dir(dir.path(), ',', fixed_time()).unwrap();
    let second = evening.write_to_dir(dir.path(), ',', fixed_time()).unwrap();

    assert_eq!(
        second.file_name().unwrap().to_str().unwrap(),
        "lfa_analysis_2026-10-18_1.csv"
    );
    assert!(std::fs::read_to_string(&first).unwrap().contains("a.png"));
    assert!(std::fs::read_to_string(&second).unwrap().contains("b.png"));
}
