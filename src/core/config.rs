//! PV-002: Optional YAML defaults (`provrec.yaml`) and validation.
//!
//! Precedence when resolving a setting: CLI flag, then config file, then
//! the built-in default.

use super::error::{ProvenanceError, Result};
use super::types::HashAlgorithm;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "provrec.yaml";

/// Default provenance output path.
pub const DEFAULT_PROVENANCE_FILE: &str = "provenance.json";

/// Defaults read from `provrec.yaml`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvenanceConfig {
    /// Schema version (must be "1.0")
    #[serde(default = "default_version")]
    pub version: String,

    /// Default hash algorithm name
    #[serde(default)]
    pub hash_algorithm: Option<String>,

    /// Default provenance file path
    #[serde(default)]
    pub provenance_file: Option<PathBuf>,

    /// Append-only JSONL event log
    #[serde(default)]
    pub event_log: Option<PathBuf>,

    /// Treat a verification mismatch as a failing exit
    #[serde(default)]
    pub tripwire: bool,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            hash_algorithm: None,
            provenance_file: None,
            event_log: None,
            tripwire: false,
        }
    }
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse config YAML from a string.
pub fn parse_config(yaml: &str) -> std::result::Result<ProvenanceConfig, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Parse a config file from disk.
pub fn parse_config_file(path: &Path) -> Result<ProvenanceConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ProvenanceError::io(path, e))?;
    parse_config(&content).map_err(|reason| ProvenanceError::Config {
        path: path.to_path_buf(),
        reason,
    })
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &ProvenanceConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(ValidationError {
            message: format!("version must be \"1.0\", got \"{}\"", config.version),
        });
    }

    if let Some(name) = &config.hash_algorithm {
        if let Err(e) = name.parse::<HashAlgorithm>() {
            errors.push(ValidationError {
                message: e.to_string(),
            });
        }
    }

    for (field, value) in [
        ("provenance_file", &config.provenance_file),
        ("event_log", &config.event_log),
    ] {
        if value.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            errors.push(ValidationError {
                message: format!("{} must not be empty", field),
            });
        }
    }

    errors
}

/// Load the effective config.
///
/// An explicit path must exist. Without one, `provrec.yaml` in `cwd` is used
/// if present, otherwise built-in defaults apply.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<ProvenanceConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = cwd.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                return Ok(ProvenanceConfig::default());
            }
            candidate
        }
    };

    let config = parse_config_file(&path)?;
    let errors = validate_config(&config);
    if !errors.is_empty() {
        let reason = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ProvenanceError::Config { path, reason });
    }
    tracing::debug!(config = %path.display(), "loaded config");
    Ok(config)
}

impl ProvenanceConfig {
    /// Effective hash algorithm name: flag, then config, then `sha256`.
    pub fn resolve_algorithm(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.hash_algorithm.clone())
            .unwrap_or_else(|| HashAlgorithm::default().name().to_string())
    }

    /// Effective provenance file: flag, then config, then `provenance.json`.
    pub fn resolve_provenance_file(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.provenance_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROVENANCE_FILE))
    }

    /// Effective event log, if any.
    pub fn resolve_event_log(&self, flag: Option<&Path>) -> Option<PathBuf> {
        flag.map(Path::to_path_buf).or_else(|| self.event_log.clone())
    }
}
