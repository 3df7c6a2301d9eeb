//! LFA Core Library
//!
//! Region-of-interest selection, region extraction and classification
//! reporting for lateral flow assay strip images.

pub mod classification;
pub mod config;
pub mod dataset;
pub mod decoders;
pub mod error;
pub mod exporters;
pub mod extraction;
pub mod geometry;
pub mod labels;
pub mod report;
pub mod selection;
pub mod training;
pub mod workspace;

// Re-export commonly used types
pub use classification::{
    ClassificationResult, ClassificationSession, ClassificationState, ConfidencePolicy,
    FixedScoresEngine, FloorMethod, ImageVariant, InferenceEngine, RawInference,
};
pub use decoders::{decode_image, DecodedImage};
pub use error::{LfaError, Result};
pub use geometry::{to_native, DisplayTransform, Point, SurfaceBounds};
pub use labels::{derive_metrics, metrics_table, ConcentrationLabel, DerivedMetrics};
pub use report::{
    AnalysisLog, AnalysisLogEntry, OperatorAnnotations, ReportBuilder, ReportDocument,
    ReportMetadata,
};
pub use selection::{PixelRect, SelectionRect, SelectionTracker};
pub use training::{ProgressSource, SimulatedProgress, TrainingSession, TrainingState};
pub use workspace::AnalysisWorkspace;
