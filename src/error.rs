//! Error types for typegen.
//!
//! Fatal problems abort the run through [`TypegenError`]. Everything else is
//! recorded as a [`Diagnostic`] tagged with the pipeline stage and source
//! location it came from, and the run carries on.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

/// The main error type for typegen operations.
#[derive(Debug, Error)]
pub enum TypegenError {
    /// A Go source file could not be parsed.
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// An external tool failed to start or exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// The query literal could not be rewritten.
    #[error("Literal error: {0}")]
    Literal(String),

    /// The enclosing function signature does not fit the rename convention.
    #[error("Signature error: {0}")]
    Signature(String),

    /// Result columns of a query could not be described.
    #[error("Introspection error: {0}")]
    Introspection(String),

    /// The rewritten source is not valid Go.
    #[error("Render error: {0}")]
    Render(String),

    /// Two different declarations were synthesized under the same name.
    #[error("Type name collision: '{0}' was generated for two different queries")]
    Collision(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker task panicked or was cancelled.
    #[error("Worker task failed: {0}")]
    Task(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The run finished with non-fatal errors.
    #[error("{0}")]
    Aggregate(Diagnostics),
}

impl TypegenError {
    /// Create a parse error for the given file.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an external tool error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for TypegenError {
    fn from(err: sqlx::Error) -> Self {
        TypegenError::Database(err.to_string())
    }
}

/// Result type alias for typegen operations.
pub type TypegenResult<T> = Result<T, TypegenError>;

/// Pipeline stage a diagnostic was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Format,
    Reindent,
    Introspect,
    Rename,
    Render,
    Write,
    Aggregate,
    Imports,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Format => "format",
            Stage::Reindent => "reindent",
            Stage::Introspect => "introspect",
            Stage::Rename => "rename",
            Stage::Render => "render",
            Stage::Write => "write",
            Stage::Aggregate => "aggregate",
            Stage::Imports => "imports",
        };
        f.write_str(name)
    }
}

/// A position in a source file (1-indexed line, 1-indexed column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(path: &Path, line: usize, column: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            line,
            column,
        }
    }

    /// A location that only names a file.
    pub fn file(path: &Path) -> Self {
        Self::new(path, 0, 0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.path.display())
        } else {
            write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
        }
    }
}

/// One non-fatal failure.
#[derive(Debug, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub location: Location,
    #[serde(rename = "message", serialize_with = "serialize_display")]
    pub error: TypegenError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.location, self.error)
    }
}

fn serialize_display<S: Serializer>(err: &TypegenError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

/// Every non-fatal failure of a run, in arrival order.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Diagnostics raised in one stage.
    pub fn in_stage(&self, stage: Stage) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.stage == stage)
    }

    /// Turn a non-empty set into an aggregate error.
    pub fn into_result(self) -> TypegenResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(TypegenError::Aggregate(self))
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

/// Shared sending half of the diagnostics channel.
///
/// Unbounded, so a worker never blocks on reporting.
#[derive(Debug, Clone)]
pub struct ErrorSink {
    tx: mpsc::UnboundedSender<Diagnostic>,
}

impl ErrorSink {
    /// Create a sink and the receiver that drains it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Diagnostic>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn report(&self, stage: Stage, location: Location, error: TypegenError) {
        tracing::warn!(%stage, %location, "{}", error);
        // The receiver lives until every worker has finished.
        let _ = self.tx.send(Diagnostic {
            stage,
            location,
            error,
        });
    }
}

/// Drain a closed diagnostics channel.
pub async fn collect(mut rx: mpsc::UnboundedReceiver<Diagnostic>) -> Diagnostics {
    let mut diagnostics = Diagnostics::default();
    while let Some(d) = rx.recv().await {
        diagnostics.push(d);
    }
    diagnostics
}
