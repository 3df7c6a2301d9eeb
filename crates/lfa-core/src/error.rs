//! Error taxonomy for the analyzer core.
//!
//! Every variant is a local, recoverable condition. Callers are expected to
//! report the specific variant to the operator and keep prior state intact.

use thiserror::Error;

/// Errors produced by the analyzer core.
#[derive(Debug, Error)]
pub enum LfaError {
    /// The display surface has a zero (or non-finite) width or height.
    #[error("invalid display surface: {width}x{height}")]
    InvalidSurface { width: f64, height: f64 },

    /// A crop was requested for a selection with no area.
    #[error("selection is empty; drag a region before applying the crop")]
    EmptySelection,

    /// Raw inference scores sum to zero (or contain invalid values).
    #[error("inference returned degenerate scores: {0:?}")]
    DegenerateScores(Vec<f64>),

    /// Inference returned a score vector of the wrong length.
    #[error("inference returned {actual} scores, expected {expected}")]
    LabelCountMismatch { expected: usize, actual: usize },

    /// A classification is already in flight for this session.
    #[error("a classification is already running")]
    AlreadyRunning,

    /// Label index outside the known label set.
    #[error("unknown label index {0}")]
    UnknownLabel(usize),

    /// Label name not in the known label set.
    #[error("unknown label name '{0}'")]
    UnknownLabelName(String),

    /// A state machine was asked to perform an action its current state forbids.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    /// The inference collaborator failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Image decoding failed.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// Image or document export failed.
    #[error("export failed: {0}")]
    Export(String),

    /// Configuration could not be read or written.
    #[error("configuration error: {0}")]
    Config(String),

    /// The analysis log has no entries to export.
    #[error("analysis log is empty")]
    EmptyLog,

    /// Training was started without any dataset images.
    #[error("training dataset is empty")]
    EmptyDataset,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, LfaError>;
