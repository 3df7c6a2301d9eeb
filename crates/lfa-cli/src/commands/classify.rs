use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lfa_cli::{image_name, report_dir, AnnotationArgs, EngineArgs, RegionArgs};
use lfa_core::config::config_handle;
use lfa_core::report::format_percent;
use lfa_core::{
    derive_metrics, metrics_table, AnalysisWorkspace, ClassificationResult, ClassificationSession,
    DerivedMetrics, InferenceEngine, ReportBuilder, ReportMetadata,
};

/// Interval between checks on the background inference.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Serialize)]
struct ClassifyOutput<'a> {
    image: &'a str,
    result: &'a ClassificationResult,
    metrics: DerivedMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<PathBuf>,
}

pub fn cmd_classify(
    input: PathBuf,
    region: RegionArgs,
    engine: EngineArgs,
    annotations: AnnotationArgs,
    out: Option<PathBuf>,
    no_report: bool,
    json: bool,
) -> Result<()> {
    let config = &config_handle().config;
    let spec = region.spec().map_err(|e| anyhow!(e))?;
    let inference: Arc<dyn InferenceEngine> = Arc::new(engine.engine().map_err(|e| anyhow!(e))?);
    let name = image_name(&input);

    let decoded = lfa_core::decode_image(&input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    if !json {
        println!("Classifying {} ({}x{})...", name, decoded.width, decoded.height);
    }

    let mut workspace = AnalysisWorkspace::new();
    workspace.load_image(name.as_str(), decoded);
    if let Some(spec) = &spec {
        spec.apply(&mut workspace)?;
    }
    let (image, variant) = workspace
        .current_image()
        .context("no image loaded")?;

    let mut session = ClassificationSession::new(engine.policy(&config.classification));
    let started = Instant::now();
    session.spawn_classify(image.clone(), variant, inference)?;

    let result = loop {
        if let Some(outcome) = session.poll() {
            break outcome?.clone();
        }
        thread::sleep(POLL_INTERVAL);
    };
    log::debug!(
        "inference finished in {:.1} ms",
        started.elapsed().as_secs_f64() * 1000.0
    );

    let metrics = derive_metrics(result.label_index)?;
    let mut metadata = ReportMetadata::now().with_image_name(name.as_str());
    if let Some(annotations) = annotations.annotations() {
        metadata = metadata.with_annotations(annotations);
    }

    let report_path = if no_report {
        None
    } else {
        let document = ReportBuilder::build(&result, &metrics_table(), &metadata);
        let dir = report_dir(&out);
        let path = document
            .write_to_dir(&dir, config.report.delimiter)
            .with_context(|| format!("failed to write report to {}", dir.display()))?;
        Some(path)
    };

    if json {
        let output = ClassifyOutput {
            image: &name,
            result: &result,
            metrics,
            report: report_path,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  Source image:   {}", result.source_image);
    println!("  Predicted:      {}", result.label());
    println!("  Confidence:     {}", format_percent(result.confidence()));
    if let Some(floor) = &result.floor_applied {
        println!(
            "  Floor applied:  {} (raw {})",
            format_percent(floor.floor),
            format_percent(floor.original_probability)
        );
    }
    println!(
        "  Bacterial count: {} {}",
        metrics.bacterial_count,
        lfa_core::labels::COUNT_UNIT
    );
    println!(
        "  Cell count:      {} {}",
        metrics.cell_count,
        lfa_core::labels::COUNT_UNIT
    );
    if let Some(true_class) = metadata.annotations.as_ref().and_then(|a| a.true_class) {
        let verdict = if true_class == result.label() {
            "correct"
        } else {
            "incorrect"
        };
        println!("  True class:     {} ({})", true_class, verdict);
    }
    println!();
    println!("  Probabilities:");
    for label in lfa_core::ConcentrationLabel::ALL {
        let marker = if label == result.label() { "*" } else { " " };
        println!(
            "   {} {:<14} {:>7}",
            marker,
            label.name(),
            format_percent(result.probability_of(label))
        );
    }
    if let Some(path) = report_path {
        println!();
        println!("Report saved to {}", path.display());
    }

    Ok(())
}
