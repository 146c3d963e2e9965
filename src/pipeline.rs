//! Per-file rewrite pipeline.
//!
//! For every query literal in a file: format, reindent, replace, and for
//! typegen calls synthesize a result type and rename the enclosing
//! function's result. Failures are reported per call site and the file
//! carries on. The file is written once at the end, atomically, and only if
//! its content actually changed.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ErrorSink, Location, Stage, TypegenResult};
use crate::extractor::extract;
use crate::formatter::QueryFormatter;
use crate::gotools::GoTools;
use crate::indent::{dedent, literal_for_call};
use crate::introspect::SchemaIntrospector;
use crate::methods::{Capabilities, Capability};
use crate::planner::{apply_rename, RenamePlan};
use crate::source::{validate, SourceTree};
use crate::typegen::{synthesize, GeneratedType};

/// Marker that suppresses type synthesis for a query.
pub const IGNORE_MARKER: &str = "typegen-ignore";

/// Everything a file worker needs, shared across all workers of a run.
#[derive(Clone)]
pub struct Pipeline {
    pub caps: Capabilities,
    pub formatter: Arc<dyn QueryFormatter>,
    /// `None` disables type synthesis.
    pub introspector: Option<Arc<dyn SchemaIntrospector>>,
    pub tools: Arc<dyn GoTools>,
    pub ignore_marker: String,
    pub dry_run: bool,
}

/// What processing one file produced.
#[derive(Debug, Default)]
pub struct FileOutcome {
    pub call_sites: usize,
    pub types: Vec<GeneratedType>,
    pub renames: Vec<RenamePlan>,
    /// The file was (or in dry-run mode, would have been) rewritten.
    pub rewritten: bool,
}

impl Pipeline {
    pub fn new(
        formatter: Arc<dyn QueryFormatter>,
        introspector: Option<Arc<dyn SchemaIntrospector>>,
        tools: Arc<dyn GoTools>,
    ) -> Self {
        Self {
            caps: Capabilities::default(),
            formatter,
            introspector,
            tools,
            ignore_marker: IGNORE_MARKER.to_string(),
            dry_run: false,
        }
    }

    /// Run the whole pipeline over one file.
    pub async fn process_file(&self, mut tree: SourceTree, sink: &ErrorSink) -> FileOutcome {
        let extraction = extract(&tree, &self.caps);
        let mut outcome = FileOutcome {
            call_sites: extraction.calls.len(),
            ..Default::default()
        };

        for call in &extraction.calls {
            let loc = Location::new(tree.path(), call.line, call.column);

            let formatted = match self.formatter.format(&dedent(&call.raw)).await {
                Ok(f) => f,
                Err(e) => {
                    sink.report(Stage::Format, loc, e);
                    continue;
                }
            };

            let literal = match literal_for_call(&tree, call.line, &formatted) {
                Ok(l) => l,
                Err(e) => {
                    sink.report(Stage::Reindent, loc, e);
                    continue;
                }
            };
            tree.replace(call.literal.clone(), literal);

            if call.capability != Capability::Typegen {
                continue;
            }
            let Some(introspector) = &self.introspector else {
                continue;
            };
            if formatted.contains(&self.ignore_marker) {
                tracing::debug!(location = %loc, "ignore marker, skipping type synthesis");
                continue;
            }

            let ty = match synthesize(&formatted, introspector.as_ref()).await {
                Ok(ty) => ty,
                Err(e) => {
                    sink.report(Stage::Introspect, loc, e);
                    continue;
                }
            };

            match apply_rename(&mut tree, extraction.function(call), &ty.name) {
                Ok(plan) => outcome.renames.push(plan),
                Err(e) => sink.report(Stage::Rename, loc, e),
            }
            outcome.types.push(ty);
        }

        outcome.rewritten = self.finish(tree, sink).await;
        outcome
    }

    /// Render, validate, normalize and write. Returns whether the file
    /// changed on disk.
    async fn finish(&self, tree: SourceTree, sink: &ErrorSink) -> bool {
        if !tree.is_dirty() {
            return false;
        }
        // No borrow of the tree may live across an await.
        let owned = tree.path().to_path_buf();
        let path = owned.as_path();
        let file = || Location::file(path);

        let rendered = match tree.render().and_then(|r| validate(path, &r).map(|_| r)) {
            Ok(r) => r,
            Err(e) => {
                sink.report(Stage::Render, file(), e);
                return false;
            }
        };

        let normalized = match self.tools.gofmt(&rendered).await {
            Ok(n) => n,
            Err(e) => {
                sink.report(Stage::Render, file(), e);
                return false;
            }
        };

        if normalized == tree.source() {
            return false;
        }

        if self.dry_run {
            tracing::info!(path = %path.display(), "would rewrite");
            return true;
        }

        match write_atomic(path, &normalized) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "rewrote");
                true
            }
            Err(e) => {
                sink.report(Stage::Write, file(), e);
                false
            }
        }
    }
}

/// Replace `path` with `contents` through a temporary file in the same
/// directory, keeping the permissions of an existing file.
pub fn write_atomic(path: &Path, contents: &str) -> TypegenResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(".typegen-")
        .tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;

    match std::fs::metadata(path) {
        Ok(meta) => std::fs::set_permissions(tmp.path(), meta.permissions())?,
        Err(_) => set_default_permissions(tmp.path())?,
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_default_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Write only when the file does not already hold `contents`.
pub fn write_if_changed(path: &Path, contents: &str) -> TypegenResult<bool> {
    if let Ok(existing) = std::fs::read_to_string(path)
        && existing == contents
    {
        return Ok(false);
    }
    write_atomic(path, contents)?;
    Ok(true)
}
