//! Classification session
//!
//! Wraps a single inference run on the current image (original or cropped)
//! in a small state machine:
//!
//! ```text
//! Ready -> Running -> Complete
//!                  -> Failed
//! Complete | Failed -> Running   (a new attempt)
//! ```
//!
//! The inference collaborator is injected through [`InferenceEngine`] so
//! tests and the CLI can drive the session with deterministic engines.

mod normalize;


use std::fmt;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::decoders::DecodedImage;
use crate::error::{LfaError, Result};
use crate::labels::{ConcentrationLabel, LABEL_COUNT};

pub use normalize::{apply_confidence_floor, normalize_scores, ConfidencePolicy, FloorMethod};

/// Which image a classification ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageVariant {
    Original,
    Cropped,
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageVariant::Original => write!(f, "original"),
            ImageVariant::Cropped => write!(f, "cropped"),
        }
    }
}

/// Raw output of the inference collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInference {
    /// Predicted label index
    pub label_index: usize,
    /// Unnormalized non-negative score per label
    pub scores: Vec<f64>,
}

/// External inference collaborator.
pub trait InferenceEngine: Send + Sync {
    /// Identifier recorded on every result (model path, version tag, ...).
    fn model_identifier(&self) -> &str;

    /// Run inference on `image`.
    fn infer(&self, image: &DecodedImage) -> Result<RawInference>;
}

/// Score vector returned by the default [`FixedScoresEngine`].
pub const REFERENCE_SCORES: [f64; LABEL_COUNT] = [0.05, 0.87, 0.06, 0.02];

/// Model identifier reported by the default [`FixedScoresEngine`].
pub const REFERENCE_MODEL: &str = "anti_overfitting_model.pth";

/// Engine returning a fixed score vector regardless of the image.
///
/// Stands in for the external model when no real one is wired up.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedScoresEngine {
    scores: Vec<f64>,
    label_index: Option<usize>,
    model_identifier: String,
}

impl FixedScoresEngine {
    /// Engine predicting the argmax of `scores`.
    pub fn new(scores: Vec<f64>, model_identifier: impl Into<String>) -> Self {
        Self {
            scores,
            label_index: None,
            model_identifier: model_identifier.into(),
        }
    }

    /// Force the predicted label instead of using the argmax.
    pub fn with_label(mut self, label_index: usize) -> Self {
        self.label_index = Some(label_index);
        self
    }

    fn argmax(&self) -> usize {
        self.scores
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &s)| {
                if s > best.1 {
                    (i, s)
                } else {
                    best
                }
            })
            .0
    }
}

impl Default for FixedScoresEngine {
    fn default() -> Self {
        Self::new(REFERENCE_SCORES.to_vec(), REFERENCE_MODEL)
    }
}

impl InferenceEngine for FixedScoresEngine {
    fn model_identifier(&self) -> &str {
        &self.model_identifier
    }

    fn infer(&self, _image: &DecodedImage) -> Result<RawInference> {
        Ok(RawInference {
            label_index: self.label_index.unwrap_or_else(|| self.argmax()),
            scores: self.scores.clone(),
        })
    }
}

/// Record of a confidence floor that changed a result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedFloor {
    pub floor: f64,
    pub method: FloorMethod,
    /// Normalized probability of the predicted label before the floor
    pub original_probability: f64,
}

/// Outcome of a successful classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(deserialize_with = "deserialize_label_index")]
    pub label_index: usize,
    /// Normalized probabilities in label order; sum to 1.0
    pub probabilities: [f64; LABEL_COUNT],
    pub source_image: ImageVariant,
    pub model_identifier: String,
    pub timestamp: DateTime<Utc>,
    /// Set when the confidence floor altered the distribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_applied: Option<AppliedFloor>,
}

/// Rejects label indices outside the label table so a loaded result can
/// always be indexed.
fn deserialize_label_index<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let index = usize::deserialize(deserializer)?;
    if index < LABEL_COUNT {
        Ok(index)
    } else {
        Err(serde::de::Error::custom(format!(
            "label index {} out of range (0..{})",
            index, LABEL_COUNT
        )))
    }
}

impl ClassificationResult {
    pub fn label(&self) -> ConcentrationLabel {
        // label_index is validated when a result is built or deserialized
        ConcentrationLabel::ALL[self.label_index]
    }

    /// Probability of the predicted label.
    pub fn confidence(&self) -> f64 {
        self.probabilities[self.label_index]
    }

    pub fn probability_of(&self, label: ConcentrationLabel) -> f64 {
        self.probabilities[label.index()]
    }
}

/// Session state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClassificationState {
    #[default]
    Ready,
    Running {
        variant: ImageVariant,
    },
    Complete,
    Failed {
        error: String,
    },
}

impl ClassificationState {
    fn name(&self) -> &'static str {
        match self {
            ClassificationState::Ready => "ready",
            ClassificationState::Running { .. } => "running",
            ClassificationState::Complete => "complete",
            ClassificationState::Failed { .. } => "failed",
        }
    }
}

/// An inference running on a worker thread.
struct PendingInference {
    rx: Receiver<Result<RawInference>>,
    handle: Option<JoinHandle<()>>,
}

/// Classification state machine. At most one classification is in flight.
pub struct ClassificationSession {
    state: ClassificationState,
    policy: ConfidencePolicy,
    /// Model identifier captured when the running attempt began
    running_model: Option<String>,
    result: Option<ClassificationResult>,
    last_successful: Option<ClassificationResult>,
    pending: Option<PendingInference>,
}

impl Default for ClassificationSession {
    fn default() -> Self {
        Self::new(ConfidencePolicy::default())
    }
}

impl ClassificationSession {
    pub fn new(policy: ConfidencePolicy) -> Self {
        Self {
            state: ClassificationState::Ready,
            policy,
            running_model: None,
            result: None,
            last_successful: None,
            pending: None,
        }
    }

    pub fn state(&self) -> &ClassificationState {
        &self.state
    }

    pub fn policy(&self) -> ConfidencePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ConfidencePolicy) {
        self.policy = policy;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ClassificationState::Running { .. })
    }

    /// Result of the current attempt; only present while `Complete`.
    pub fn result(&self) -> Option<&ClassificationResult> {
        match self.state {
            ClassificationState::Complete => self.result.as_ref(),
            _ => None,
        }
    }

    /// Most recent successful result, kept across failed attempts.
    pub fn last_successful(&self) -> Option<&ClassificationResult> {
        self.last_successful.as_ref()
    }

    /// Enter `Running` for `variant`. The previous attempt's result is discarded.
    pub fn begin(&mut self, variant: ImageVariant, model_identifier: &str) -> Result<()> {
        if self.is_running() {
            return Err(LfaError::AlreadyRunning);
        }
        log::debug!(
            "classification started on {} image with model {}",
            variant,
            model_identifier
        );
        self.result = None;
        self.running_model = Some(model_identifier.to_string());
        self.state = ClassificationState::Running { variant };
        Ok(())
    }

    /// Feed the inference outcome into the running attempt.
    pub fn finish(&mut self, outcome: Result<RawInference>) -> Result<&ClassificationResult> {
        let variant = match self.state {
            ClassificationState::Running { variant } => variant,
            ref other => {
                return Err(LfaError::InvalidTransition {
                    state: other.name(),
                    action: "finish a classification",
                })
            }
        };
        let model_identifier = self.running_model.take().unwrap_or_default();

        match outcome.and_then(|raw| self.build_result(raw, variant, model_identifier)) {
            Ok(result) => {
                log::info!(
                    "classified {} image as {} ({:.2}%)",
                    variant,
                    result.label(),
                    result.confidence() * 100.0
                );
                self.last_successful = Some(result.clone());
                self.state = ClassificationState::Complete;
                let stored: &ClassificationResult = self.result.insert(result);
                Ok(stored)
            }
            Err(err) => {
                log::warn!("classification failed: {}", err);
                self.state = ClassificationState::Failed {
                    error: err.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Run a classification synchronously.
    pub fn classify(
        &mut self,
        image: &DecodedImage,
        variant: ImageVariant,
        engine: &dyn InferenceEngine,
    ) -> Result<&ClassificationResult> {
        self.begin(variant, engine.model_identifier())?;
        let outcome = engine.infer(image);
        self.finish(outcome)
    }

    /// Start a classification on a worker thread; collect it with [`poll`](Self::poll)
    /// or [`wait`](Self::wait).
    pub fn spawn_classify(
        &mut self,
        image: DecodedImage,
        variant: ImageVariant,
        engine: Arc<dyn InferenceEngine>,
    ) -> Result<()> {
        self.begin(variant, engine.model_identifier())?;

        let (tx, rx) = channel();
        let handle = thread::spawn(move || {
            // receiver gone means the session was dropped
            let _ = tx.send(engine.infer(&image));
        });

        self.pending = Some(PendingInference {
            rx,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Check for a finished background inference. Returns `None` while it is
    /// still running or when nothing is pending.
    pub fn poll(&mut self) -> Option<Result<&ClassificationResult>> {
        let pending = self.pending.as_mut()?;
        let outcome = match pending.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(LfaError::Inference(
                "inference worker exited without a result".to_string(),
            )),
        };
        self.join_pending();
        Some(self.finish(outcome))
    }

    /// Block until the background inference finishes.
    pub fn wait(&mut self) -> Option<Result<&ClassificationResult>> {
        let pending = self.pending.as_mut()?;
        let outcome = pending.rx.recv().unwrap_or_else(|_| {
            Err(LfaError::Inference(
                "inference worker exited without a result".to_string(),
            ))
        });
        self.join_pending();
        Some(self.finish(outcome))
    }

    fn join_pending(&mut self) {
        if let Some(mut pending) = self.pending.take() {
            if let Some(handle) = pending.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn build_result(
        &self,
        raw: RawInference,
        variant: ImageVariant,
        model_identifier: String,
    ) -> Result<ClassificationResult> {
        if raw.scores.len() != LABEL_COUNT {
            return Err(LfaError::LabelCountMismatch {
                expected: LABEL_COUNT,
                actual: raw.scores.len(),
            });
        }
        if raw.label_index >= LABEL_COUNT {
            return Err(LfaError::UnknownLabel(raw.label_index));
        }

        let mut probabilities = normalize_scores(&raw.scores)?;
        let original_probability = probabilities[raw.label_index];

        let floor_applied = match self.policy.floor {
            Some(floor)
                if apply_confidence_floor(
                    &mut probabilities,
                    raw.label_index,
                    floor,
                    self.policy.method,
                ) =>
            {
                log::debug!(
                    "confidence floor {:.2} raised {} from {:.4}",
                    floor,
                    ConcentrationLabel::ALL[raw.label_index],
                    original_probability
                );
                Some(AppliedFloor {
                    floor,
                    method: self.policy.method,
                    original_probability,
                })
            }
            _ => None,
        };

        Ok(ClassificationResult {
            label_index: raw.label_index,
            probabilities,
            source_image: variant,
            model_identifier,
            timestamp: Utc::now(),
            floor_applied,
        })
    }
}
