//! Argument structs shared between commands.

use clap::{Args, ValueEnum};
use lfa_core::config::ClassificationConfig;
use lfa_core::{
    ConcentrationLabel, ConfidencePolicy, FixedScoresEngine, FloorMethod, OperatorAnnotations,
};

use crate::parsers::{parse_floor, parse_label, parse_scores};
use crate::processing::{build_annotations, build_engine};
use crate::region::RegionSpec;

/// Region selection shared between Crop and Classify.
#[derive(Args, Clone, Debug, Default)]
pub struct RegionArgs {
    /// Region in native pixels (x,y,width,height)
    #[arg(long, value_name = "X,Y,W,H")]
    pub roi: Option<String>,

    /// Pointer drag in display coordinates (down point : release point)
    #[arg(long, value_name = "X0,Y0:X1,Y1", allow_hyphen_values = true)]
    pub drag: Option<String>,

    /// Size the image was displayed at while dragging (defaults to native size)
    #[arg(long, value_name = "WxH")]
    pub display: Option<String>,
}

impl RegionArgs {
    pub fn spec(&self) -> Result<Option<RegionSpec>, String> {
        RegionSpec::from_args(
            self.roi.as_deref(),
            self.drag.as_deref(),
            self.display.as_deref(),
        )
    }
}

/// Stand-in inference engine settings.
#[derive(Args, Clone, Debug, Default)]
pub struct EngineArgs {
    /// Raw per-label scores returned by the engine (comma-separated, label order)
    #[arg(long, value_name = "S0,S1,S2,S3")]
    pub scores: Option<String>,

    /// Force the predicted label index instead of the highest score
    #[arg(long, value_name = "N")]
    pub label: Option<usize>,

    /// Model identifier recorded on results
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,

    /// Minimum displayed probability for the predicted label (0.0-1.0)
    #[arg(long, value_name = "FLOAT", value_parser = parse_floor)]
    pub confidence_floor: Option<f64>,

    /// How the remaining probability is redistributed when the floor applies
    #[arg(long, value_enum)]
    pub floor_method: Option<FloorMethodArg>,
}

impl EngineArgs {
    /// Build the engine, falling back to the reference scores.
    pub fn engine(&self) -> Result<FixedScoresEngine, String> {
        let scores = self.scores.as_deref().map(parse_scores).transpose()?;
        Ok(build_engine(scores, self.label, self.model.clone()))
    }

    /// Confidence policy: command line options override the configured ones.
    pub fn policy(&self, config: &ClassificationConfig) -> ConfidencePolicy {
        let method = self
            .floor_method
            .map(FloorMethod::from)
            .unwrap_or(config.floor_method);
        match self.confidence_floor.or(config.confidence_floor) {
            Some(floor) => ConfidencePolicy::with_floor(floor, method),
            None => ConfidencePolicy {
                floor: None,
                method,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FloorMethodArg {
    Proportional,
    Uniform,
}

impl From<FloorMethodArg> for FloorMethod {
    fn from(arg: FloorMethodArg) -> Self {
        match arg {
            FloorMethodArg::Proportional => FloorMethod::Proportional,
            FloorMethodArg::Uniform => FloorMethod::Uniform,
        }
    }
}

/// Ground truth entered by the operator.
#[derive(Args, Clone, Debug, Default)]
pub struct AnnotationArgs {
    /// True concentration class (e.g. 10_Nanogram)
    #[arg(long, value_name = "CLASS", value_parser = parse_label)]
    pub true_class: Option<ConcentrationLabel>,

    /// True bacterial count as measured
    #[arg(long, value_name = "COUNT")]
    pub true_bacterial_count: Option<String>,

    /// True cell count as measured
    #[arg(long, value_name = "COUNT")]
    pub true_cell_count: Option<String>,
}

impl AnnotationArgs {
    pub fn annotations(&self) -> Option<OperatorAnnotations> {
        build_annotations(
            self.true_class,
            self.true_bacterial_count.clone(),
            self.true_cell_count.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_floor_overrides_config() {
        let config = ClassificationConfig {
            confidence_floor: Some(0.3),
            ..ClassificationConfig::default()
        };
        let args = EngineArgs {
            confidence_floor: Some(0.6),
            floor_method: Some(FloorMethodArg::Uniform),
            ..EngineArgs::default()
        };
        let policy = args.policy(&config);
        assert_eq!(policy.floor, Some(0.6));
        assert_eq!(policy.method, FloorMethod::Uniform);

        let policy = EngineArgs::default().policy(&config);
        assert_eq!(policy.floor, Some(0.3));
        assert_eq!(policy.method, FloorMethod::Proportional);
    }

    #[test]
    fn test_engine_rejects_bad_scores() {
        let args = EngineArgs {
            scores: Some("0.1,abc".to_string()),
            ..EngineArgs::default()
        };
        assert!(args.engine().is_err());
    }

    #[test]
    fn test_engine_uses_explicit_scores_and_model() {
        let args = EngineArgs {
            scores: Some("1,2,3,4".to_string()),
            model: Some("unit".to_string()),
            ..EngineArgs::default()
        };
        let engine = args.engine().unwrap();
        assert_eq!(
            engine,
            FixedScoresEngine::new(vec![1.0, 2.0, 3.0, 4.0], "unit")
        );
    }
}
