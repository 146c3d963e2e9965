//! Package discovery and the per-package generated file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ErrorSink, Location, Stage, TypegenError, TypegenResult};
use crate::gotools::GoTools;
use crate::pipeline::write_if_changed;
use crate::source::SourceTree;
use crate::typegen::GeneratedType;

pub const BANNER: &str = "// Code generated by typegen; DO NOT EDIT.";
pub const UUID_IMPORT: &str = "github.com/google/uuid";

/// Go files sharing a directory and a package clause.
#[derive(Debug)]
pub struct GoPackage {
    pub dir: PathBuf,
    pub name: String,
    pub files: Vec<SourceTree>,
}

/// `<dir>/<prefix><package>.go`
pub fn output_path(dir: &Path, package: &str, prefix: &str) -> PathBuf {
    dir.join(format!("{}{}.go", prefix, package))
}

/// Whether a file is our own output, recognized by its banner.
pub fn is_generated(source: &str) -> bool {
    source.starts_with(BANNER)
}

/// Find and parse every Go file under `root`, grouped into packages.
///
/// Files carrying the generated banner are skipped. Any file that fails to
/// parse aborts discovery.
pub fn discover(root: &Path, recursive: bool) -> TypegenResult<Vec<GoPackage>> {
    let mut walker = ignore::WalkBuilder::new(root);
    if !recursive {
        walker.max_depth(Some(1));
    }

    let mut paths = Vec::new();
    for entry in walker.build() {
        let entry = entry.map_err(|e| TypegenError::Config(format!("walking {}: {}", root.display(), e)))?;
        let is_file = entry.file_type().is_some_and(|t| t.is_file());
        let is_go = entry.path().extension().is_some_and(|e| e == "go");
        if is_file && is_go {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut grouped: BTreeMap<(PathBuf, String), Vec<SourceTree>> = BTreeMap::new();
    for path in paths {
        let source = std::fs::read_to_string(&path)?;
        if is_generated(&source) {
            tracing::debug!(path = %path.display(), "skipping generated file");
            continue;
        }
        let tree = SourceTree::parse(&path, source)?;
        let name = tree
            .package_name()
            .ok_or_else(|| TypegenError::parse(&path, "missing package clause"))?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        grouped.entry((dir, name)).or_default().push(tree);
    }

    Ok(grouped
        .into_iter()
        .map(|((dir, name), files)| GoPackage { dir, name, files })
        .collect())
}

/// Drop repeated types and sort by name. Two different declarations under
/// one name are a collision; the first one is kept.
pub fn merge_types(types: Vec<GeneratedType>) -> (Vec<GeneratedType>, Vec<TypegenError>) {
    let mut merged: BTreeMap<String, GeneratedType> = BTreeMap::new();
    let mut collisions = Vec::new();
    for ty in types {
        match merged.get(&ty.name) {
            Some(existing) if *existing != ty => {
                collisions.push(TypegenError::Collision(ty.name.clone()));
            }
            Some(_) => {}
            None => {
                merged.insert(ty.name.clone(), ty);
            }
        }
    }
    (merged.into_values().collect(), collisions)
}

/// Unformatted contents of a generated file.
pub fn assemble(package: &str, enums: &str, types: &[GeneratedType], tag_key: &str) -> String {
    let mut out = format!("{BANNER}\n\npackage {package}\n\nimport \"{UUID_IMPORT}\"\n");
    out.push_str(enums);
    for ty in types {
        out.push('\n');
        out.push_str(&ty.render(tag_key));
    }
    out
}

/// What [`Aggregator::finish`] did for one package.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Generated {
    /// Distinct types after merging.
    pub types: usize,
    /// The generated file was (or in dry-run mode, would have been) written.
    pub changed: bool,
}

/// Writes the generated file of each package.
#[derive(Clone)]
pub struct Aggregator {
    pub tools: Arc<dyn GoTools>,
    pub enums: Arc<str>,
    pub tag_key: String,
    pub prefix: String,
    pub dry_run: bool,
}

impl Aggregator {
    pub async fn finish(
        &self,
        dir: &Path,
        package: &str,
        types: Vec<GeneratedType>,
        sink: &ErrorSink,
    ) -> Generated {
        if types.is_empty() {
            return Generated::default();
        }
        let path = output_path(dir, package, &self.prefix);
        let loc = || Location::file(&path);

        let (types, collisions) = merge_types(types);
        for e in collisions {
            sink.report(Stage::Aggregate, loc(), e);
        }
        let mut out = Generated {
            types: types.len(),
            changed: false,
        };

        // Never clobber a hand-written file that happens to have our name.
        if let Ok(existing) = std::fs::read_to_string(&path)
            && !is_generated(&existing)
        {
            let err = std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "file exists and was not generated by typegen",
            );
            sink.report(Stage::Write, loc(), err.into());
            return out;
        }

        let raw = assemble(package, &self.enums, &types, &self.tag_key);
        let contents = match self.tools.goimports(&path, &raw).await {
            Ok(c) => c,
            Err(e) => {
                sink.report(Stage::Imports, loc(), e);
                return out;
            }
        };

        if self.dry_run {
            out.changed = std::fs::read_to_string(&path).map_or(true, |old| old != contents);
            if out.changed {
                tracing::info!(path = %path.display(), types = out.types, "would write");
            }
            return out;
        }

        match write_if_changed(&path, &contents) {
            Ok(changed) => {
                if changed {
                    tracing::info!(path = %path.display(), types = out.types, "wrote generated types");
                }
                out.changed = changed;
            }
            Err(e) => sink.report(Stage::Write, loc(), e),
        }
        out
    }
}
