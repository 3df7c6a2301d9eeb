use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Once, OnceLock};

use crate::classification::{ConfidencePolicy, FloorMethod, REFERENCE_MODEL};
use crate::error::{LfaError, Result};

/// Canonical list of candidate config file names we search for on disk.
pub const CONFIG_FILENAMES: &[&str] = &["lfa.yml", "lfa.yaml"];

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "LFA_CONFIG";

/// Public handle that stores the loaded configuration, its source path, and warnings.
pub struct LfaConfigHandle {
    pub config: LfaConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl LfaConfigHandle {
    fn with_config(config: LfaConfig, source: Option<PathBuf>, warnings: Vec<String>) -> Self {
        Self {
            config,
            source,
            warnings,
        }
    }
}

/// Complete configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LfaConfig {
    pub classification: ClassificationConfig,
    pub report: ReportConfig,
    pub training: TrainingConfig,
}

impl LfaConfig {
    /// Clamp or reset out-of-range values, recording a warning for each change.
    pub fn sanitize(mut self, warnings: &mut Vec<String>) -> Self {
        self.classification.sanitize(warnings);
        self.report.sanitize(warnings);
        self.training.sanitize(warnings);
        self
    }
}

/// Classification defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Minimum displayed probability for the predicted label (disabled when absent)
    pub confidence_floor: Option<f64>,
    /// How the remaining probability is redistributed when the floor applies
    pub floor_method: FloorMethod,
    /// Identifier recorded on results produced by the bundled engine
    pub model_identifier: String,
}

impl ClassificationConfig {
    fn sanitize(&mut self, warnings: &mut Vec<String>) {
        if let Some(floor) = self.confidence_floor {
            if !floor.is_finite() {
                warnings.push(format!("confidence_floor {} is not finite; disabled", floor));
                self.confidence_floor = None;
            } else if !(0.0..=1.0).contains(&floor) {
                let clamped = floor.clamp(0.0, 1.0);
                warnings.push(format!(
                    "confidence_floor {} outside [0, 1]; using {}",
                    floor, clamped
                ));
                self.confidence_floor = Some(clamped);
            }
        }
        if self.model_identifier.trim().is_empty() {
            self.model_identifier = Self::default().model_identifier;
        }
    }

    /// Confidence policy described by this section.
    pub fn policy(&self) -> ConfidencePolicy {
        match self.confidence_floor {
            Some(floor) => ConfidencePolicy::with_floor(floor, self.floor_method),
            None => ConfidencePolicy {
                floor: None,
                method: self.floor_method,
            },
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            confidence_floor: None,
            floor_method: FloorMethod::Proportional,
            model_identifier: REFERENCE_MODEL.to_string(),
        }
    }
}

/// Report export defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Field separator for exported documents
    pub delimiter: char,
    /// Directory exported documents are written to
    pub output_dir: PathBuf,
}

impl ReportConfig {
    fn sanitize(&mut self, warnings: &mut Vec<String>) {
        if matches!(self.delimiter, '"' | '\n' | '\r') {
            warnings.push(format!(
                "report delimiter {:?} is not allowed; using ','",
                self.delimiter
            ));
            self.delimiter = ',';
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            output_dir: PathBuf::from("."),
        }
    }
}

/// Simulated training defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Progress added per tick (percent)
    pub step: f64,
    /// Delay between ticks in milliseconds
    pub cadence_ms: u64,
}

impl TrainingConfig {
    fn sanitize(&mut self, warnings: &mut Vec<String>) {
        let defaults = Self::default();
        if !(self.step.is_finite() && self.step > 0.0) {
            warnings.push(format!(
                "training step {} must be positive; using {}",
                self.step, defaults.step
            ));
            self.step = defaults.step;
        }
        self.step = self.step.min(100.0);
        if self.cadence_ms == 0 {
            warnings.push("training cadence_ms must be at least 1; using 1".to_string());
            self.cadence_ms = 1;
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            step: 2.0,
            cadence_ms: 100,
        }
    }
}

/// Load configuration from disk, optionally forcing a specific path.
pub fn load_config(custom_path: Option<&Path>) -> LfaConfigHandle {
    let mut warnings = Vec::new();
    let candidates = get_config_candidates(custom_path);

    for candidate in candidates {
        if !candidate.exists() || !candidate.is_file() {
            continue;
        }

        match fs::read_to_string(&candidate) {
            Ok(contents) => match serde_yaml::from_str::<LfaConfig>(&contents) {
                Ok(config) => {
                    let sanitized = config.sanitize(&mut warnings);
                    let source = fs::canonicalize(&candidate).unwrap_or(candidate);
                    return LfaConfigHandle::with_config(sanitized, Some(source), warnings);
                }
                Err(err) => warnings.push(format!(
                    "Failed to parse config {}: {}",
                    candidate.display(),
                    err
                )),
            },
            Err(err) => warnings.push(format!(
                "Failed to read config {}: {}",
                candidate.display(),
                err
            )),
        }
    }

    warnings.push("No config found; using built-in defaults.".to_string());
    LfaConfigHandle::with_config(LfaConfig::default(), None, warnings)
}

/// Get list of config file candidates to try
fn get_config_candidates(custom_path: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = custom_path {
        candidates.push(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        candidates.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(cwd.join("config").join(name));
            candidates.push(cwd.join(name));
        }
    }

    if let Some(home_dir) = dirs::home_dir() {
        for name in CONFIG_FILENAMES {
            candidates.push(home_dir.join("lfa").join(name));
        }
    }

    candidates
}

static CONFIG_HANDLE: OnceLock<LfaConfigHandle> = OnceLock::new();
static LOG_CONFIG_ONCE: Once = Once::new();

/// Access the global configuration (loaded once per process).
pub fn config_handle() -> &'static LfaConfigHandle {
    CONFIG_HANDLE.get_or_init(|| load_config(None))
}

/// Install an explicitly loaded configuration as the global one.
///
/// Returns the handle that ends up installed; if the global configuration was
/// already initialized, the existing handle wins.
pub fn install_config(handle: LfaConfigHandle) -> &'static LfaConfigHandle {
    let _ = CONFIG_HANDLE.set(handle);
    config_handle()
}

/// Log config source and warnings the first time it is requested.
pub fn log_config_usage() {
    LOG_CONFIG_ONCE.call_once(|| {
        let handle = config_handle();
        if let Some(source) = &handle.source {
            log::debug!("loaded config from {}", source.display());
        } else {
            log::debug!("using built-in config defaults");
        }

        for warning in &handle.warnings {
            log::warn!("config: {}", warning);
        }
    });
}

/// YAML text of the default configuration, as written by `lfa init`.
pub fn default_config_yaml() -> Result<String> {
    let body = serde_yaml::to_string(&LfaConfig::default())
        .map_err(|e| LfaError::Config(e.to_string()))?;
    Ok(format!(
        "# LFA analyzer configuration\n\
         # Set classification.confidence_floor (0.0-1.0) to enable the floor.\n\
         {}",
        body
    ))
}

/// Per-user config location (`~/lfa/lfa.yml`).
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("lfa").join(CONFIG_FILENAMES[0]))
}

/// Write the default configuration to `path`, refusing to overwrite unless `force`.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(LfaError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, default_config_yaml()?)?;
    log::info!("wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_path_is_loaded_and_sanitized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lfa.yml");
        fs::write(
            &path,
            "classification:\n  confidence_floor: 1.5\n  floor_method: uniform\n\
             training:\n  step: -3\n  cadence_ms: 0\n",
        )
        .unwrap();

        let handle = load_config(Some(&path));

        assert!(handle.source.is_some());
        let config = &handle.config;
        assert_eq!(config.classification.confidence_floor, Some(1.0));
        assert_eq!(config.classification.floor_method, FloorMethod::Uniform);
        assert_eq!(config.training.step, 2.0);
        assert_eq!(config.training.cadence_ms, 1);
        assert_eq!(config.report.delimiter, ',');
        assert_eq!(handle.warnings.len(), 3);
    }

    #[test]
    fn test_quote_delimiter_rejected() {
        let mut warnings = Vec::new();
        let config = LfaConfig {
            report: ReportConfig {
                delimiter: '"',
                ..ReportConfig::default()
            },
            ..LfaConfig::default()
        }
        .sanitize(&mut warnings);

        assert_eq!(config.report.delimiter, ',');
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_policy_from_config() {
        let config = ClassificationConfig {
            confidence_floor: Some(0.6),
            floor_method: FloorMethod::Uniform,
            ..ClassificationConfig::default()
        };
        let policy = config.policy();
        assert_eq!(policy.floor, Some(0.6));
        assert_eq!(policy.method, FloorMethod::Uniform);

        assert_eq!(ClassificationConfig::default().policy().floor, None);
    }

    #[test]
    fn test_default_yaml_parses_back_to_defaults() {
        let yaml = default_config_yaml().unwrap();
        let parsed: LfaConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, LfaConfig::default());
    }

    #[test]
    fn test_write_default_config_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("lfa.yml");

        write_default_config(&path, false).unwrap();
        assert!(path.exists());
        assert!(matches!(
            write_default_config(&path, false),
            Err(LfaError::Config(_))
        ));
        write_default_config(&path, true).unwrap();
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lfa.yaml");
        fs::write(&path, "report:\n  delimiter: \";\"\n").unwrap();

        let handle = load_config(Some(&path));
        assert_eq!(handle.config.report.delimiter, ';');
        assert_eq!(handle.config.training, TrainingConfig::default());
        assert!(handle.warnings.is_empty());
    }
}
