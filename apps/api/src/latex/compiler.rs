//! LaTeX compilation: renders document source to PDF with an external compiler.
//!
//! Each call gets its own `TempDir` workspace holding `main.tex` and whatever
//! the compiler writes next to it. The directory is removed when the guard
//! drops, so every return path (success, compiler failure, timeout, I/O error)
//! cleans up.
//!
//! `AppState` holds an `Arc<dyn ArtifactRenderer>`; tests swap in fakes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

const WORKSPACE_PREFIX: &str = "resume_compile_";
const SOURCE_FILE: &str = "main.tex";
const ARTIFACT_FILE: &str = "main.pdf";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to create temp dir: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("failed to write tex file: {0}")]
    WriteSource(#[source] std::io::Error),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit. `log` is the compiler's stdout followed by its stderr.
    #[error("{program} failed: {status}\nOutput:\n{log}")]
    Failed {
        program: String,
        status: String,
        log: String,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("failed to read generated pdf: {0}")]
    MissingArtifact(#[source] std::io::Error),

    #[error("compiler is not accepting jobs")]
    Unavailable,
}

/// Turns document source into a rendered binary artifact.
#[async_trait]
pub trait ArtifactRenderer: Send + Sync {
    async fn render(&self, source: &str) -> Result<Vec<u8>, CompileError>;
}

#[derive(Debug, Clone)]
pub struct CompilerSettings {
    /// Executable name (resolved through PATH) or path.
    pub program: String,
    /// Placed before the standard flags.
    pub extra_args: Vec<String>,
    pub timeout: Duration,
    pub max_concurrent: usize,
    /// Parent for workspaces; the system temp dir when `None`.
    pub workspace_root: Option<PathBuf>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            program: "pdflatex".to_string(),
            extra_args: Vec::new(),
            timeout: Duration::from_secs(60),
            max_concurrent: 4,
            workspace_root: None,
        }
    }
}

/// Runs `pdflatex` (or a compatible program) in non-interactive mode.
pub struct LatexCompiler {
    settings: CompilerSettings,
    permits: Semaphore,
}

impl LatexCompiler {
    pub fn new(settings: CompilerSettings) -> Self {
        let permits = Semaphore::new(settings.max_concurrent.max(1));
        Self { settings, permits }
    }

    fn create_workspace(&self) -> Result<TempDir, CompileError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        match &self.settings.workspace_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(CompileError::Workspace)
    }

    async fn run_compiler(
        &self,
        workspace: &Path,
        source_path: &Path,
    ) -> Result<std::process::Output, CompileError> {
        let program = &self.settings.program;

        let mut command = Command::new(program);
        command
            .args(&self.settings.extra_args)
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(workspace)
            .arg(source_path)
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tokio::time::timeout(self.settings.timeout, command.output())
            .await
            .map_err(|_| CompileError::TimedOut {
                program: program.clone(),
                timeout: self.settings.timeout,
            })?
            .map_err(|source| CompileError::Spawn {
                program: program.clone(),
                source,
            })
    }
}

#[async_trait]
impl ArtifactRenderer for LatexCompiler {
    async fn render(&self, source: &str) -> Result<Vec<u8>, CompileError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CompileError::Unavailable)?;

        let workspace = self.create_workspace()?;
        debug!("Compiling in {}", workspace.path().display());

        let source_path = workspace.path().join(SOURCE_FILE);
        tokio::fs::write(&source_path, source)
            .await
            .map_err(CompileError::WriteSource)?;

        let output = self.run_compiler(workspace.path(), &source_path).await?;

        if !output.status.success() {
            let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
            log.push_str(&String::from_utf8_lossy(&output.stderr));
            warn!(
                "{} compilation failed ({}):\n{}",
                self.settings.program, output.status, log
            );
            return Err(CompileError::Failed {
                program: self.settings.program.clone(),
                status: output.status.to_string(),
                log,
            });
        }

        tokio::fs::read(workspace.path().join(ARTIFACT_FILE))
            .await
            .map_err(CompileError::MissingArtifact)
    }
}
