//! Shared utilities for lfa-cli
//!
//! Argument parsing and path handling used by the `lfa` commands.

pub mod args;
pub mod parsers;
pub mod processing;
pub mod region;

// Re-export commonly used items at the crate root for convenience
pub use args::{AnnotationArgs, EngineArgs, FloorMethodArg, RegionArgs};
pub use parsers::{parse_display, parse_drag, parse_floor, parse_label, parse_roi, parse_scores};
pub use processing::{
    build_annotations, build_engine, determine_output_path, image_name, report_dir,
};
pub use region::RegionSpec;
