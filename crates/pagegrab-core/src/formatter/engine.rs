//! Primary pretty-printing engine and its one-shot availability cell.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Failure inside a pretty-printing engine. Never escapes [`super::Formatter::format`].
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {code:?}: {stderr}")]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("engine produced no output")]
    EmptyOutput,
}

/// A full-featured script pretty-printer.
#[async_trait]
pub trait PrettyPrinter: Send + Sync {
    async fn pretty_print(&self, code: &str) -> Result<String, FormatError>;

    fn name(&self) -> &'static str;
}

/// Snapshot of the engine cell taken at the start of one format call.
#[derive(Clone)]
pub enum EngineState {
    Available(Arc<dyn PrettyPrinter>),
    Unavailable,
}

/// Process-wide engine capability: starts unavailable, becomes available at
/// most once. Clones share the same cell.
#[derive(Clone, Default)]
pub struct FormatterEngine {
    slot: Arc<OnceLock<Arc<dyn PrettyPrinter>>>,
}

impl FormatterEngine {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn available(engine: Arc<dyn PrettyPrinter>) -> Self {
        let this = Self::default();
        this.install(engine);
        this
    }

    /// Current state. Callers hold on to this for the whole call.
    pub fn current(&self) -> EngineState {
        match self.slot.get() {
            Some(engine) => EngineState::Available(Arc::clone(engine)),
            None => EngineState::Unavailable,
        }
    }

    /// Installs the engine. Returns false if one was already installed.
    pub fn install(&self, engine: Arc<dyn PrettyPrinter>) -> bool {
        let name = engine.name();
        let installed = self.slot.set(engine).is_ok();
        if installed {
            tracing::info!(engine = name, "formatter engine available");
        }
        installed
    }

    /// Looks for `program` on PATH in the background and installs it if it
    /// answers `--version`. Format calls issued before this finishes use the
    /// heuristic path.
    pub fn spawn_discovery(&self, program: &str) -> tokio::task::JoinHandle<bool> {
        let this = self.clone();
        let program = program.to_string();
        tokio::spawn(async move {
            let found = {
                let program = program.clone();
                tokio::task::spawn_blocking(move || ExternalBeautifier::from_path(&program))
                    .await
                    .ok()
                    .flatten()
            };
            let Some(engine) = found else {
                tracing::info!(program = %program, "formatter engine not found; using heuristic formatting");
                return false;
            };
            if !engine.probe().await {
                tracing::warn!(program = %program, "formatter engine did not answer --version");
                return false;
            }
            this.install(Arc::new(engine))
        })
    }
}

/// Pipes code through an external `js-beautify` compatible binary.
#[derive(Debug, Clone)]
pub struct ExternalBeautifier {
    binary_path: PathBuf,
    args: Vec<String>,
}

impl ExternalBeautifier {
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            args: vec!["--indent-size".into(), "2".into(), "-".into()],
        }
    }

    /// Attempt to find `program` in PATH.
    pub fn from_path(program: &str) -> Option<Self> {
        which::which(program).ok().map(Self::new)
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// True if the binary runs and exits cleanly with `--version`.
    pub async fn probe(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn program(&self) -> String {
        self.binary_path.display().to_string()
    }
}

#[async_trait]
impl PrettyPrinter for ExternalBeautifier {
    async fn pretty_print(&self, code: &str) -> Result<String, FormatError> {
        let mut child = Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FormatError::Spawn {
                program: self.program(),
                source,
            })?;

        // Feed stdin from its own task so a large output cannot stall the write.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = code.to_string();
            tokio::spawn(async move {
                let _ = stdin.write_all(input.as_bytes()).await;
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| FormatError::Spawn {
                program: self.program(),
                source,
            })?;
        if let Some(writer) = writer {
            let _ = writer.await;
        }

        if !output.status.success() {
            return Err(FormatError::Exit {
                program: self.program(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() && !code.trim().is_empty() {
            return Err(FormatError::EmptyOutput);
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "external-beautifier"
    }
}
