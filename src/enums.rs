//! Enum declarations shared by every generated file.
//!
//! Extracted once per run, before any package is processed.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{TypegenError, TypegenResult};
use crate::process::ToolCommand;

/// Lines from this marker onwards are enum declarations in schema tool output.
pub const ENUM_MARKER: &str = "enum type";

/// Where enum declarations come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumSource {
    /// Run `xo schema` and scan its output.
    #[default]
    SchemaTool,
    /// Read `pg_type` / `pg_enum` directly.
    Catalog,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumConfig {
    pub source: EnumSource,
    pub schema: String,
    pub program: String,
    pub go_pkg: String,
    pub go_uuid: String,
    pub field_tag: String,
}

impl Default for EnumConfig {
    fn default() -> Self {
        Self {
            source: EnumSource::SchemaTool,
            schema: "public".to_string(),
            program: "xo".to_string(),
            go_pkg: "dev".to_string(),
            go_uuid: "github.com/google/uuid".to_string(),
            field_tag: "db:\"{{ .SQLName }}\"".to_string(),
        }
    }
}

impl EnumConfig {
    fn schema_tool(&self, database_url: &str, out: &Path) -> ToolCommand {
        ToolCommand::new(
            self.program.clone(),
            vec![
                "schema".to_string(),
                database_url.to_string(),
                format!("--go-pkg={}", self.go_pkg),
                format!("--go-uuid={}", self.go_uuid),
                format!("--schema={}", self.schema),
                format!("--go-field-tag={}", self.field_tag),
                "-o".to_string(),
                out.to_string_lossy().into_owned(),
            ],
        )
    }
}

/// Produce the enum block for generated files.
///
/// `pool` is only consulted by [`EnumSource::Catalog`].
pub async fn extract_enums(
    config: &EnumConfig,
    database_url: &str,
    pool: Option<&PgPool>,
) -> TypegenResult<String> {
    match config.source {
        EnumSource::None => Ok(String::new()),
        EnumSource::SchemaTool => from_schema_tool(config, database_url).await,
        EnumSource::Catalog => {
            let pool = pool.ok_or_else(|| {
                TypegenError::Config("enum source 'catalog' needs a database connection".into())
            })?;
            from_catalog(pool, &config.schema).await
        }
    }
}

async fn from_schema_tool(config: &EnumConfig, database_url: &str) -> TypegenResult<String> {
    let dir = tempfile::Builder::new().prefix("typegen-xo-").tempdir()?;
    config
        .schema_tool(database_url, dir.path())
        .run(&[], None)
        .await?;

    let mut files = Vec::new();
    for entry in ignore::WalkBuilder::new(dir.path())
        .standard_filters(false)
        .build()
    {
        let entry = entry.map_err(|e| {
            TypegenError::tool(&config.program, format!("walking generated files: {}", e))
        })?;
        if entry.file_type().is_some_and(|t| t.is_file())
            && entry.path().extension().is_some_and(|e| e == "go")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut enums = String::new();
    for file in files {
        let text = tokio::fs::read_to_string(&file).await?;
        enums.push_str(&scan_enums(&text));
    }
    tracing::debug!(bytes = enums.len(), "extracted enums from schema tool");
    Ok(enums)
}

/// Everything from the first marker line to the end of `text`, with a blank
/// line before each marker line.
pub fn scan_enums(text: &str) -> String {
    let mut out = String::new();
    let mut copying = false;
    for line in text.lines() {
        if line.contains(ENUM_MARKER) {
            copying = true;
            out.push('\n');
        }
        if copying {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[derive(Debug, sqlx::FromRow)]
struct EnumLabel {
    name: String,
    label: String,
}

async fn from_catalog(pool: &PgPool, schema: &str) -> TypegenResult<String> {
    let rows: Vec<EnumLabel> = sqlx::query_as(
        "select t.typname::text as name, e.enumlabel::text as label \
         from pg_type t \
         join pg_enum e on e.enumtypid = t.oid \
         join pg_namespace n on n.oid = t.typnamespace \
         where n.nspname = $1 \
         order by t.typname, e.enumsortorder",
    )
    .bind(schema)
    .fetch_all(pool)
    .await?;

    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for row in rows {
        match grouped.last_mut() {
            Some((name, labels)) if *name == row.name => labels.push(row.label),
            _ => grouped.push((row.name, vec![row.label])),
        }
    }

    Ok(grouped
        .iter()
        .map(|(name, labels)| render_enum(schema, name, labels))
        .collect())
}

/// A string-typed Go enum carrying the marker comment.
pub fn render_enum(schema: &str, name: &str, labels: &[String]) -> String {
    use heck::ToUpperCamelCase;

    let ty = name.to_upper_camel_case();
    let mut out = format!(
        "\n// {ty} is the '{name}' {ENUM_MARKER} from schema '{schema}'.\ntype {ty} string\n\n// {ty} values.\nconst (\n"
    );
    for label in labels {
        let variant = format!("{}{}", ty, label.to_upper_camel_case());
        out.push_str(&format!(
            "\t// {variant} is the '{label}' {name}.\n\t{variant} {ty} = \"{label}\"\n"
        ));
    }
    out.push_str(")\n");
    out
}
