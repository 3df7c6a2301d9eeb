//! Training session
//!
//! Tracks the progress of an external training process. Progress arrives as
//! events from a [`ProgressSource`], pulled on every [`TrainingSession::tick`];
//! the session never blocks and never drives training itself.
//!
//! ```text
//! Idle -> Running -> Complete   (progress reached 100)
//!                 -> Stopped    (stop() or the source ran dry)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::TrainingDataset;
use crate::error::{LfaError, Result};

/// Progress value at which training is complete.
pub const PROGRESS_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingState {
    #[default]
    Idle,
    Running,
    Complete,
    Stopped,
}

impl TrainingState {
    fn name(self) -> &'static str {
        match self {
            TrainingState::Idle => "idle",
            TrainingState::Running => "running",
            TrainingState::Complete => "complete",
            TrainingState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for TrainingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One progress report from the training process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Percentage points gained since the previous event
    pub delta: f64,
    /// Optional line for the training log
    pub message: Option<String>,
}

/// Source of training progress events.
pub trait ProgressSource: Send {
    /// Next event, or `None` once the process has nothing more to report.
    fn next_event(&mut self) -> Option<ProgressEvent>;
}

/// Fixed-step progress, one step per event, until 100% has been reported.
#[derive(Debug, Clone)]
pub struct SimulatedProgress {
    step: f64,
    reported: f64,
}

impl SimulatedProgress {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            reported: 0.0,
        }
    }
}

impl Default for SimulatedProgress {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl ProgressSource for SimulatedProgress {
    fn next_event(&mut self) -> Option<ProgressEvent> {
        if self.reported >= PROGRESS_MAX || self.step <= 0.0 {
            return None;
        }
        let before = self.reported;
        self.reported = (self.reported + self.step).min(PROGRESS_MAX);

        // one log line per 10% boundary crossed
        let decile = (self.reported / 10.0).floor();
        let message = (decile > (before / 10.0).floor())
            .then(|| format!("reached {:.0}%", decile * 10.0));

        Some(ProgressEvent {
            delta: self.step,
            message,
        })
    }
}

/// Training progress state machine.
pub struct TrainingSession {
    state: TrainingState,
    progress: f64,
    log: Vec<String>,
    source: Option<Box<dyn ProgressSource>>,
}

impl Default for TrainingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingSession {
    pub fn new() -> Self {
        Self {
            state: TrainingState::Idle,
            progress: 0.0,
            log: Vec::new(),
            source: None,
        }
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Progress in percent, 0-100.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Ordered log lines.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn is_running(&self) -> bool {
        self.state == TrainingState::Running
    }

    /// Start training on `dataset`, pulling progress from `source`.
    ///
    /// Starting from `Complete` or `Stopped` resets progress and log first.
    pub fn start(&mut self, dataset: &TrainingDataset, source: Box<dyn ProgressSource>) -> Result<()> {
        if self.is_running() {
            return Err(LfaError::InvalidTransition {
                state: self.state.name(),
                action: "start training",
            });
        }
        if dataset.is_empty() {
            return Err(LfaError::EmptyDataset);
        }

        self.clear();
        self.source = Some(source);
        self.state = TrainingState::Running;
        self.push_log(format!("training started on {} images", dataset.len()));
        Ok(())
    }

    /// Pull one event from the source. No-op unless running.
    pub fn tick(&mut self) -> TrainingState {
        if !self.is_running() {
            return self.state;
        }

        let event = match self.source.as_mut().and_then(|s| s.next_event()) {
            Some(event) => event,
            None => {
                let line = format!("progress source finished at {:.0}%", self.progress);
                self.halt(line);
                return self.state;
            }
        };

        if event.delta.is_finite() && event.delta > 0.0 {
            self.progress = (self.progress + event.delta).min(PROGRESS_MAX);
        } else if event.delta != 0.0 {
            log::debug!("ignoring progress delta {}", event.delta);
        }
        if let Some(message) = event.message {
            self.push_log(message);
        }

        if self.progress >= PROGRESS_MAX {
            self.source = None;
            self.state = TrainingState::Complete;
            self.push_log("training complete".to_string());
        }
        self.state
    }

    /// Stop a running session.
    pub fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(LfaError::InvalidTransition {
                state: self.state.name(),
                action: "stop training",
            });
        }
        let line = format!("training stopped at {:.0}%", self.progress);
        self.halt(line);
        Ok(())
    }

    /// Clear progress and log and return to `Idle`.
    pub fn reset(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(LfaError::InvalidTransition {
                state: self.state.name(),
                action: "reset training",
            });
        }
        self.clear();
        Ok(())
    }

    fn halt(&mut self, line: String) {
        self.source = None;
        self.state = TrainingState::Stopped;
        self.push_log(line);
    }

    fn clear(&mut self) {
        self.state = TrainingState::Idle;
        self.progress = 0.0;
        self.log.clear();
        self.source = None;
    }

    fn push_log(&mut self, line: String) {
        log::info!("training: {}", line);
        self.log.push(line);
    }
}
