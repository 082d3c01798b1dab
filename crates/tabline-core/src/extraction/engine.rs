//! Process boundary to the external table-extraction engine.

use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::TablineError;
use crate::extraction::{ArtifactFormat, ExtractionRequest};

/// Longest diagnostic tail kept from the engine's error stream.
const MAX_DIAGNOSTIC_BYTES: usize = 16 * 1024;

/// Shared flag that stops an in-flight extraction and kills the engine.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Extraction flags for one request, in the order the engine expects.
pub fn build_args(
    request: &ExtractionRequest,
    format: ArtifactFormat,
    artifact: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        request.mode.flag().into(),
        "--pages".into(),
        request.pages.as_str().into(),
    ];
    if let Some(area) = &request.area {
        args.push("--area".into());
        args.push(area.to_token().into());
    }
    args.push("--format".into());
    args.push(format.engine_token().into());
    args.push("--outfile".into());
    args.push(artifact.into());
    args.push(request.document.clone().into());
    args
}

/// Kills and reaps the child if it is still running when dropped.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn try_wait(&mut self) -> Result<Option<ExitStatus>, TablineError> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = kill_engine(&mut self.child) {
            warn!(pid = self.child.id(), error = %e, "failed to kill table extraction engine");
        }
        match self.child.wait() {
            Ok(_) => self.reaped = true,
            Err(e) => warn!(pid = self.child.id(), error = %e, "failed to reap table extraction engine"),
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Kill the engine along with every process it started.
#[cfg(unix)]
fn kill_engine(child: &mut Child) -> std::io::Result<()> {
    // The engine leads its own process group; a negative pid signals the whole group.
    let group = child.id() as libc::pid_t;
    if unsafe { libc::kill(-group, libc::SIGKILL) } == 0 {
        return Ok(());
    }
    child.kill()
}

#[cfg(not(unix))]
fn kill_engine(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}

/// Run the engine to completion inside `workdir`.
///
/// Blocks until the engine exits, the timeout elapses, or `cancel` fires.
/// In the last two cases the engine is killed before returning. On unix the
/// engine runs in its own process group, and the whole group is killed.
pub fn run_engine(
    config: &EngineConfig,
    args: &[OsString],
    workdir: &Path,
    cancel: &CancelToken,
) -> Result<(), TablineError> {
    let diagnostics_path = workdir.join("engine.stderr");
    let diagnostics_file = File::create(&diagnostics_path)?;

    debug!(
        program = %config.program.display(),
        base_args = ?config.args,
        ?args,
        "spawning table extraction engine"
    );

    let mut command = Command::new(&config.program);
    command
        .args(&config.args)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::from(diagnostics_file));
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let child = command
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TablineError::EngineNotFound {
                    program: config.program.display().to_string(),
                }
            } else {
                TablineError::Io(e)
            }
        })?;

    let mut guard = ChildGuard {
        child,
        reaped: false,
    };
    let timeout = config.timeout();
    let started = Instant::now();

    loop {
        if let Some(status) = guard.try_wait()? {
            debug!(?status, elapsed_ms = started.elapsed().as_millis() as u64, "engine exited");
            if status.success() {
                return Ok(());
            }
            return Err(TablineError::EngineInvocationFailed {
                code: status.code(),
                diagnostics: read_diagnostics(&diagnostics_path),
            });
        }

        if cancel.is_cancelled() {
            guard.terminate();
            return Err(TablineError::Cancelled);
        }

        let elapsed = started.elapsed();
        if elapsed >= timeout {
            guard.terminate();
            return Err(TablineError::EngineTimeout {
                timeout,
                diagnostics: read_diagnostics(&diagnostics_path),
            });
        }

        std::thread::sleep(config.poll_interval().min(timeout - elapsed));
    }
}

/// Probe the engine with `--version`; any exit status counts as present.
pub fn is_available(config: &EngineConfig) -> bool {
    Command::new(&config.program)
        .args(&config.args)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map(|o| o.status.success() || !o.stderr.is_empty())
        .unwrap_or(false)
}

fn read_diagnostics(path: &Path) -> String {
    let bytes = std::fs::read(path).unwrap_or_default();
    let tail = &bytes[bytes.len().saturating_sub(MAX_DIAGNOSTIC_BYTES)..];
    String::from_utf8_lossy(tail).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{CropArea, ExtractionMode, PageSelector};

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_build_args_stream_without_area() {
        let req = ExtractionRequest::new("/data/report.pdf")
            .mode(ExtractionMode::Stream)
            .pages("1-2".parse::<PageSelector>().unwrap());
        let args = build_args(&req, ArtifactFormat::Csv, Path::new("/tmp/x/table.csv"));
        assert_eq!(
            strings(&args),
            vec![
                "--stream",
                "--pages",
                "1-2",
                "--format",
                "CSV",
                "--outfile",
                "/tmp/x/table.csv",
                "/data/report.pdf",
            ]
        );
    }

    #[test]
    fn test_build_args_lattice_with_area() {
        let req = ExtractionRequest::new("in.pdf")
            .area(CropArea::new(10.0, 20.0, 300.5, 400.0).unwrap());
        let args = strings(&build_args(&req, ArtifactFormat::Json, Path::new("out.json")));
        assert_eq!(args[0], "--lattice");
        assert!(!args.contains(&"--stream".to_string()));
        let area_at = args.iter().position(|a| a == "--area").unwrap();
        assert_eq!(args[area_at + 1], "10,20,300.5,400");
        assert_eq!(args.last().map(String::as_str), Some("in.pdf"));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_missing_program_is_engine_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::for_program("/nonexistent/tabline-test-engine");
        let err = run_engine(&config, &[], dir.path(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, TablineError::EngineNotFound { .. }));
    }
}
