use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TablineError {
    #[error("document {path} is not readable: {reason}")]
    DocumentUnreadable { path: PathBuf, reason: String },

    #[error("table extraction engine '{program}' not found. Install tabula-java or point --engine at it")]
    EngineNotFound { program: String },

    #[error("table extraction engine failed with exit code {}: {diagnostics}", exit_code_label(.code))]
    EngineInvocationFailed {
        code: Option<i32>,
        diagnostics: String,
    },

    #[error("table extraction engine timed out after {}s: {diagnostics}", .timeout.as_secs_f64())]
    EngineTimeout {
        timeout: Duration,
        diagnostics: String,
    },

    #[error("table extraction was cancelled")]
    Cancelled,

    #[error("failed to parse engine output: {0}")]
    OutputParseFailed(String),

    #[error("invalid extraction request: {0}")]
    InvalidRequest(String),

    #[error("unrecognized layout markup: {0}")]
    UnrecognizedLayout(String),

    #[error("failed to load engine config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid engine config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none (killed by signal)".into(),
    }
}
