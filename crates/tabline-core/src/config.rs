use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TablineError;
use crate::extraction::ArtifactFormat;

/// How to run the external table-extraction engine.
///
/// Every field has a default, so a config file only needs the keys it
/// changes; unknown keys are rejected. Defaults target tabula-java: `java -jar tabula.jar`, five
/// minute timeout, JSON artifacts for in-memory matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub program: PathBuf,
    /// Arguments placed before the extraction flags.
    pub args: Vec<String>,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Parent directory for per-invocation scratch directories.
    pub temp_dir: Option<PathBuf>,
    /// Artifact format used when the caller asks for an in-memory matrix.
    pub matrix_format: ArtifactFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            program: PathBuf::from("java"),
            args: vec!["-jar".into(), "tabula.jar".into()],
            timeout_ms: 300_000,
            poll_interval_ms: 50,
            temp_dir: None,
            matrix_format: ArtifactFormat::Json,
        }
    }
}

impl EngineConfig {
    /// Config for an engine binary invoked directly, without base arguments.
    pub fn for_program(program: impl Into<PathBuf>) -> Self {
        EngineConfig {
            program: program.into(),
            args: Vec::new(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Load an engine config from a JSON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, TablineError> {
    let content = std::fs::read_to_string(path).map_err(|e| TablineError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse an engine config from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<EngineConfig, TablineError> {
    let config: EngineConfig = serde_json::from_str(json).map_err(|e| TablineError::ConfigLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &EngineConfig) -> Result<(), TablineError> {
    if config.program.as_os_str().is_empty() {
        return Err(TablineError::ConfigInvalid(
            "program must not be empty".into(),
        ));
    }
    if config.timeout_ms == 0 {
        return Err(TablineError::ConfigInvalid(
            "timeout_ms must be greater than zero".into(),
        ));
    }
    if config.poll_interval_ms == 0 {
        return Err(TablineError::ConfigInvalid(
            "poll_interval_ms must be greater than zero".into(),
        ));
    }
    Ok(())
}
