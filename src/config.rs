//! Run configuration.
//!
//! Read from `typegen.toml` in the root directory, or failing that from the
//! user config directory. Every field has a default, so an empty or missing
//! file is a valid configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::enums::EnumConfig;
use crate::error::{TypegenError, TypegenResult};
use crate::methods::{Capabilities, QueryMethod};
use crate::pipeline::IGNORE_MARKER;
use crate::process::ToolCommand;

pub const CONFIG_FILE: &str = "typegen.toml";

/// External tool commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub pg_format: ToolCommand,
    /// `None` skips whole-file normalization.
    pub gofmt: Option<ToolCommand>,
    pub goimports: ToolCommand,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pg_format: ToolCommand::new("pg_format", ["--inplace", "--comma-break", "--tabs"]),
            gofmt: Some(ToolCommand::new("gofmt", Vec::<String>::new())),
            goimports: ToolCommand::new("goimports", Vec::<String>::new()),
        }
    }
}

impl ToolsConfig {
    /// Attach the shared concurrency limit to every command.
    pub fn limited(&self, limit: &Arc<Semaphore>) -> Self {
        Self {
            pg_format: self.pg_format.clone().with_limit(limit.clone()),
            gofmt: self.gofmt.clone().map(|c| c.with_limit(limit.clone())),
            goimports: self.goimports.clone().with_limit(limit.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory to process.
    pub root: PathBuf,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Concurrent external tool invocations. Defaults to available parallelism.
    pub jobs: Option<usize>,
    pub recursive: bool,
    pub methods: Vec<String>,
    pub typegen_methods: Vec<String>,
    pub ignore_marker: String,
    /// Struct tag key for generated fields.
    pub tag_key: String,
    pub output_prefix: String,
    pub enums: EnumConfig,
    pub tools: ToolsConfig,
    pub dry_run: bool,
    pub skip_typegen: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            database_url: None,
            max_connections: 4,
            jobs: None,
            recursive: true,
            methods: QueryMethod::ALL.iter().map(|m| m.name().to_string()).collect(),
            typegen_methods: QueryMethod::TYPEGEN
                .iter()
                .map(|m| m.name().to_string())
                .collect(),
            ignore_marker: IGNORE_MARKER.to_string(),
            tag_key: "db".to_string(),
            output_prefix: "typegen_".to_string(),
            enums: EnumConfig::default(),
            tools: ToolsConfig::default(),
            dry_run: false,
            skip_typegen: false,
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> TypegenResult<Self> {
        toml::from_str(text).map_err(|e| TypegenError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> TypegenResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TypegenError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
            .map_err(|e| TypegenError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the config for `root`: an explicit file, `<root>/typegen.toml`,
    /// `<config dir>/typegen/config.toml`, or defaults, in that order.
    pub fn load(root: &Path, explicit: Option<&Path>) -> TypegenResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = root.join(CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(&local);
        }

        if let Some(global) = dirs::config_dir().map(|d| d.join("typegen").join("config.toml"))
            && global.is_file()
        {
            return Self::from_file(&global);
        }

        Ok(Self::default())
    }

    pub fn jobs(&self) -> usize {
        self.jobs
            .filter(|j| *j > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(4)
    }

    /// Resolve method names once. Unknown names are a configuration error.
    pub fn capabilities(&self) -> TypegenResult<Capabilities> {
        let resolve = |names: &[String]| {
            names
                .iter()
                .map(|n| {
                    QueryMethod::from_name(n)
                        .ok_or_else(|| TypegenError::Config(format!("unknown query method '{}'", n)))
                })
                .collect::<TypegenResult<Vec<_>>>()
        };

        let caps = Capabilities::new(resolve(&self.methods)?, resolve(&self.typegen_methods)?);
        Ok(if self.skip_typegen {
            caps.without_typegen()
        } else {
            caps
        })
    }

    pub fn validate(&self) -> TypegenResult<()> {
        if self.output_prefix.is_empty() {
            return Err(TypegenError::Config("output_prefix must not be empty".into()));
        }
        if self.ignore_marker.trim().is_empty() {
            return Err(TypegenError::Config("ignore_marker must not be empty".into()));
        }
        if self.tag_key.is_empty() || self.tag_key.contains(['"', '`', ' ']) {
            return Err(TypegenError::Config(format!("invalid tag_key '{}'", self.tag_key)));
        }
        if !self.skip_typegen && self.database_url.is_none() {
            return Err(TypegenError::Config(
                "a database URL is required unless typegen is skipped".into(),
            ));
        }
        self.capabilities().map(|_| ())
    }
}
