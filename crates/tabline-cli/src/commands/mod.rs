pub mod check;
pub mod extract;
pub mod lines;

use std::path::PathBuf;
use tabline_core::config::{load_config, EngineConfig};
use tabline_core::error::TablineError;

/// Engine settings from the command line, layered over a config file.
pub struct EngineOverrides {
    pub config: Option<PathBuf>,
    pub program: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl EngineOverrides {
    pub fn resolve(self) -> Result<EngineConfig, TablineError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => EngineConfig::default(),
        };
        if let Some(program) = self.program {
            config.program = program;
            config.args.clear();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_ms = secs.saturating_mul(1000);
        }
        Ok(config)
    }
}
