//! Run orchestration.
//!
//! Discovers packages under the root, fans out one task per package and one
//! per file, gathers every non-fatal failure into a single [`Diagnostics`]
//! and returns a [`Report`]. A run that gets past setup always completes;
//! only setup failures (configuration, connection, enum extraction, source
//! parsing) abort it.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::enums::extract_enums;
use crate::error::{collect, Diagnostics, ErrorSink, Location, Stage, TypegenError, TypegenResult};
use crate::formatter::{PgFormat, QueryFormatter};
use crate::gotools::{GoToolchain, GoTools};
use crate::introspect::{PgIntrospector, SchemaIntrospector};
use crate::package::{discover, output_path, Aggregator, GoPackage};
use crate::pipeline::{FileOutcome, Pipeline};

/// The external collaborators a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub formatter: Arc<dyn QueryFormatter>,
    /// `None` turns type synthesis off.
    pub introspector: Option<Arc<dyn SchemaIntrospector>>,
    pub tools: Arc<dyn GoTools>,
}

/// Outcome of a whole run.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub packages: usize,
    pub files_scanned: usize,
    pub call_sites: usize,
    pub files_rewritten: Vec<PathBuf>,
    pub generated: Vec<PathBuf>,
    pub types: usize,
    pub renames: usize,
    pub dry_run: bool,
    pub diagnostics: Diagnostics,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Default)]
struct PackageReport {
    call_sites: usize,
    files_rewritten: Vec<PathBuf>,
    generated: Option<PathBuf>,
    types: usize,
    renames: usize,
}

pub struct Engine {
    config: Config,
    collaborators: Collaborators,
    pool: Option<PgPool>,
}

impl Engine {
    /// Build an engine over the real tools and, unless typegen is skipped, a
    /// database pool. A connection failure is fatal.
    pub async fn connect(config: Config) -> TypegenResult<Self> {
        config.validate()?;

        let limit = Arc::new(Semaphore::new(config.jobs()));
        let tools = config.tools.limited(&limit);

        let (introspector, pool) = match (&config.database_url, config.skip_typegen) {
            (Some(url), false) => {
                let pg = PgIntrospector::connect(url, config.max_connections).await?;
                tracing::info!(max_connections = config.max_connections, "connected to database");
                let pool = pg.pool().clone();
                (Some(Arc::new(pg) as Arc<dyn SchemaIntrospector>), Some(pool))
            }
            _ => (None, None),
        };

        let collaborators = Collaborators {
            formatter: Arc::new(PgFormat::new(tools.pg_format)),
            introspector,
            tools: Arc::new(GoToolchain::new(tools.gofmt, tools.goimports)),
        };
        Ok(Self {
            config,
            collaborators,
            pool,
        })
    }

    /// Build an engine over caller-supplied collaborators.
    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            pool: None,
        }
    }

    pub async fn run(&self) -> TypegenResult<Report> {
        let config = &self.config;
        let caps = config.capabilities()?;
        let typegen = self.collaborators.introspector.is_some() && !config.skip_typegen;

        // Enums only end up in generated files, so skip them when there are none.
        let enums = if typegen {
            let url = config.database_url.as_deref().unwrap_or_default();
            extract_enums(&config.enums, url, self.pool.as_ref()).await?
        } else {
            String::new()
        };

        let packages = discover(&config.root, config.recursive)?;
        let files_scanned = packages.iter().map(|p| p.files.len()).sum();
        tracing::info!(
            root = %config.root.display(),
            packages = packages.len(),
            files = files_scanned,
            "starting run"
        );

        let pipeline = Arc::new(Pipeline {
            caps: if typegen { caps } else { caps.without_typegen() },
            formatter: self.collaborators.formatter.clone(),
            introspector: if typegen {
                self.collaborators.introspector.clone()
            } else {
                None
            },
            tools: self.collaborators.tools.clone(),
            ignore_marker: config.ignore_marker.clone(),
            dry_run: config.dry_run,
        });
        let aggregator = Aggregator {
            tools: self.collaborators.tools.clone(),
            enums: Arc::from(enums),
            tag_key: config.tag_key.clone(),
            prefix: config.output_prefix.clone(),
            dry_run: config.dry_run,
        };

        let (sink, rx) = ErrorSink::channel();
        let collector = tokio::spawn(collect(rx));

        let mut report = Report {
            packages: packages.len(),
            files_scanned,
            dry_run: config.dry_run,
            ..Default::default()
        };

        let mut set = JoinSet::new();
        for package in packages {
            let pipeline = pipeline.clone();
            let aggregator = aggregator.clone();
            let sink = sink.clone();
            set.spawn(async move { process_package(package, pipeline, aggregator, sink).await });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(pkg) => {
                    report.call_sites += pkg.call_sites;
                    report.files_rewritten.extend(pkg.files_rewritten);
                    report.generated.extend(pkg.generated);
                    report.types += pkg.types;
                    report.renames += pkg.renames;
                }
                Err(e) => sink.report(
                    Stage::Aggregate,
                    Location::file(&config.root),
                    TypegenError::Task(e.to_string()),
                ),
            }
        }
        drop(sink);

        report.files_rewritten.sort();
        report.generated.sort();
        report.diagnostics = collector
            .await
            .map_err(|e| TypegenError::Task(e.to_string()))?;

        tracing::info!(
            rewritten = report.files_rewritten.len(),
            generated = report.generated.len(),
            diagnostics = report.diagnostics.len(),
            "run finished"
        );
        Ok(report)
    }
}

async fn process_package(
    package: GoPackage,
    pipeline: Arc<Pipeline>,
    aggregator: Aggregator,
    sink: ErrorSink,
) -> PackageReport {
    let GoPackage { dir, name, files } = package;
    tracing::debug!(dir = %dir.display(), package = %name, "processing package");

    let mut outcomes: Vec<Option<(PathBuf, FileOutcome)>> = Vec::new();
    outcomes.resize_with(files.len(), || None);

    let mut set = JoinSet::new();
    for (idx, tree) in files.into_iter().enumerate() {
        let pipeline = pipeline.clone();
        let sink = sink.clone();
        set.spawn(async move {
            let path = tree.path().to_path_buf();
            let outcome = pipeline.process_file(tree, &sink).await;
            (idx, path, outcome)
        });
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, path, outcome)) => outcomes[idx] = Some((path, outcome)),
            Err(e) => sink.report(
                Stage::Aggregate,
                Location::file(&dir),
                TypegenError::Task(e.to_string()),
            ),
        }
    }

    // File order, not completion order, so merging is deterministic.
    let mut report = PackageReport::default();
    let mut types = Vec::new();
    for (path, outcome) in outcomes.into_iter().flatten() {
        report.call_sites += outcome.call_sites;
        report.renames += outcome.renames.len();
        if outcome.rewritten {
            report.files_rewritten.push(path);
        }
        types.extend(outcome.types);
    }

    let generated = aggregator.finish(&dir, &name, types, &sink).await;
    report.types = generated.types;
    if generated.changed {
        report.generated = Some(output_path(&dir, &name, &aggregator.prefix));
    }
    report
}
