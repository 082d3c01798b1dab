use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::{validate_config, EngineConfig};
use crate::error::TablineError;
use crate::extraction::artifact::read_matrix;
use crate::extraction::engine::{self, build_args, run_engine, CancelToken};
use crate::extraction::{ArtifactFormat, ExtractionRequest, ExtractionResult, OutputKind};

/// Drives the external table-extraction engine for one [`EngineConfig`].
///
/// Stateless between calls: concurrent extractions of different documents
/// need no locking. Writes to one destination path are the caller's to
/// serialize.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    config: EngineConfig,
}

impl Orchestrator {
    pub fn new(config: EngineConfig) -> Result<Self, TablineError> {
        validate_config(&config)?;
        Ok(Orchestrator { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check if the engine can be started.
    pub fn engine_available(&self) -> bool {
        engine::is_available(&self.config)
    }

    pub fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, TablineError> {
        self.extract_with_cancel(request, &CancelToken::new())
    }

    /// Run one extraction; firing `cancel` kills the engine and returns
    /// [`TablineError::Cancelled`].
    ///
    /// The engine writes into a private scratch directory that is removed
    /// on every return path.
    pub fn extract_with_cancel(
        &self,
        request: &ExtractionRequest,
        cancel: &CancelToken,
    ) -> Result<ExtractionResult, TablineError> {
        check_document(&request.document)?;

        let format = match request.output {
            OutputKind::CsvFile(_) => ArtifactFormat::Csv,
            OutputKind::InMemoryMatrix => self.config.matrix_format,
        };

        let workdir = self.scratch_dir()?;
        let artifact = workdir
            .path()
            .join(format!("table.{}", format.extension()));
        let args = build_args(request, format, &artifact);

        let started = Instant::now();
        run_engine(&self.config, &args, workdir.path(), cancel)?;

        if !artifact.is_file() {
            return Err(TablineError::OutputParseFailed(
                "engine exited successfully but wrote no output file".into(),
            ));
        }

        let result = match &request.output {
            OutputKind::CsvFile(destination) => {
                move_artifact(&artifact, destination)?;
                ExtractionResult::CsvFile(destination.clone())
            }
            OutputKind::InMemoryMatrix => ExtractionResult::Matrix(read_matrix(&artifact, format)?),
        };

        info!(
            document = %request.document.display(),
            mode = %request.mode,
            pages = %request.pages,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "table extraction finished"
        );
        Ok(result)
    }

    fn scratch_dir(&self) -> Result<TempDir, TablineError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tabline-");
        let dir = match &self.config.temp_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

/// Fail before spawning anything if the document cannot be read.
fn check_document(path: &Path) -> Result<(), TablineError> {
    let unreadable = |reason: String| TablineError::DocumentUnreadable {
        path: path.to_path_buf(),
        reason,
    };
    let meta = std::fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
    if !meta.is_file() {
        return Err(unreadable("not a regular file".into()));
    }
    File::open(path).map_err(|e| unreadable(e.to_string()))?;
    Ok(())
}

/// Rename into place, falling back to a copy across filesystems.
fn move_artifact(artifact: &Path, destination: &Path) -> Result<(), TablineError> {
    if std::fs::rename(artifact, destination).is_ok() {
        return Ok(());
    }
    debug!(
        from = %artifact.display(),
        to = %destination.display(),
        "rename failed, copying artifact"
    );
    std::fs::copy(artifact, destination)?;
    std::fs::remove_file(artifact)?;
    Ok(())
}
