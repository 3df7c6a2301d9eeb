use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use lfa_cli::{image_name, report_dir, AnnotationArgs, EngineArgs};
use lfa_core::config::config_handle;
use lfa_core::dataset::expand_inputs;
use lfa_core::report::format_percent;
use lfa_core::{AnalysisLog, AnalysisLogEntry, ClassificationSession, ImageVariant};

#[allow(clippy::too_many_arguments)]
pub fn cmd_batch(
    inputs: Vec<PathBuf>,
    recursive: bool,
    engine: EngineArgs,
    annotations: AnnotationArgs,
    out: Option<PathBuf>,
    threads: Option<usize>,
    silent: bool,
) -> Result<()> {
    let batch_start = Instant::now();
    let config = &config_handle().config;

    if inputs.is_empty() {
        bail!("No input files or directories specified");
    }

    // Expand directories to file lists
    let inputs = expand_inputs(&inputs, recursive)?;
    if inputs.is_empty() {
        bail!("No supported image files found (supported: .png, .tif, .tiff)");
    }

    if !silent {
        println!("Found {} image files to classify", inputs.len());
    }

    // Configure thread pool if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .context("Failed to configure thread pool")?;
        if !silent {
            println!("Using {} threads for parallel processing", num_threads);
        }
    }

    let inference = engine.engine().map_err(|e| anyhow!(e))?;
    let policy = engine.policy(&config.classification);
    let annotations = annotations.annotations();

    let processed_count = AtomicUsize::new(0);
    let total_files = inputs.len();

    // Each image gets its own session; nothing is shared between workers
    let results: Vec<Result<AnalysisLogEntry, String>> = inputs
        .par_iter()
        .map(|input| {
            let decoded = lfa_core::decode_image(input).map_err(|e| e.to_string())?;
            let mut session = ClassificationSession::new(policy);
            let result = session
                .classify(&decoded, ImageVariant::Original, &inference)
                .map_err(|e| e.to_string())?;

            let entry =
                AnalysisLogEntry::from_result(image_name(input), result, annotations.as_ref());

            let count = processed_count.fetch_add(1, Ordering::SeqCst) + 1;
            if !silent {
                println!(
                    "[{}/{}] {} -> {} ({})",
                    count,
                    total_files,
                    input.display(),
                    entry.predicted_class,
                    format_percent(entry.confidence)
                );
            }
            Ok(entry)
        })
        .collect();

    // Summarize results, keeping input order in the log
    let mut log = AnalysisLog::new();
    let mut errors: Vec<(PathBuf, String)> = Vec::new();

    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(entry) => log.push(entry),
            Err(e) => errors.push((input.clone(), e)),
        }
    }

    let log_path = if log.is_empty() {
        None
    } else {
        let dir = report_dir(&out);
        Some(
            log.write_to_dir(&dir, config.report.delimiter, chrono::Utc::now())
                .with_context(|| format!("failed to write analysis log to {}", dir.display()))?,
        )
    };

    let batch_elapsed = batch_start.elapsed();

    if !silent {
        println!("\n========================================");
        println!("BATCH CLASSIFICATION COMPLETE");
        println!("========================================");
        println!("  Successful: {}", log.len());
        println!("  Failed:     {}", errors.len());
        if let Some(accuracy) = log.accuracy() {
            println!("  Accuracy:   {}", format_percent(accuracy));
        }
        if let Some(path) = &log_path {
            println!("  Log:        {}", path.display());
        }
        println!("  Total time: {:.2}s", batch_elapsed.as_secs_f64());

        if !errors.is_empty() {
            println!("\nErrors:");
            for (path, error) in &errors {
                println!("  {}: {}", path.display(), error);
            }
        }
    } else if let Some(path) = &log_path {
        println!("{}", path.display());
    }

    if !errors.is_empty() {
        bail!("{} of {} files failed", errors.len(), total_files);
    }

    Ok(())
}
