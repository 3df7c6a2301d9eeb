//! Parsing functions for CLI arguments.

mod classification;
mod region;

#[cfg(test)]
mod tests;

pub use classification::{parse_floor, parse_label, parse_scores};
pub use region::{parse_display, parse_drag, parse_roi};
