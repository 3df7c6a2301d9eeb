use anyhow::{bail, Result};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use lfa_core::config::config_handle;
use lfa_core::dataset::TrainingDataset;
use lfa_core::{SimulatedProgress, TrainingSession, TrainingState};

/// Drive a simulated training run over the images under `inputs`.
pub fn cmd_train(
    inputs: Vec<PathBuf>,
    step: Option<f64>,
    cadence_ms: Option<u64>,
    stop_at: Option<f64>,
) -> Result<()> {
    let training = &config_handle().config.training;

    if inputs.is_empty() {
        bail!("No training directories specified");
    }
    let step = step.unwrap_or(training.step);
    if !(step.is_finite() && step > 0.0) {
        bail!("--step must be a positive number, got {}", step);
    }
    let cadence = Duration::from_millis(cadence_ms.unwrap_or(training.cadence_ms).max(1));

    let dataset = TrainingDataset::discover(&inputs)?;
    println!("Found {} training images", dataset.len());

    let mut session = TrainingSession::new();
    session.start(&dataset, Box::new(SimulatedProgress::new(step)))?;

    let mut printed = print_new_lines(&session, 0);
    while session.is_running() {
        thread::sleep(cadence);
        session.tick();
        printed = print_new_lines(&session, printed);

        if let Some(limit) = stop_at {
            if session.is_running() && session.progress() >= limit {
                session.stop()?;
                printed = print_new_lines(&session, printed);
            }
        }
    }

    println!();
    println!("  State:    {}", session.state());
    println!("  Progress: {:.0}%", session.progress());

    if session.state() != TrainingState::Complete && stop_at.is_none() {
        bail!("training ended early at {:.0}%", session.progress());
    }
    Ok(())
}

fn print_new_lines(session: &TrainingSession, already_printed: usize) -> usize {
    let lines = session.log();
    for line in &lines[already_printed..] {
        println!("[{:>3.0}%] {}", session.progress(), line);
    }
    lines.len()
}
