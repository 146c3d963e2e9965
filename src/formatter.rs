//! SQL pretty-printing through an external formatter.

use std::io::Write;

use async_trait::async_trait;

use crate::error::{TypegenError, TypegenResult};
use crate::process::ToolCommand;

/// Pretty-prints query text.
#[async_trait]
pub trait QueryFormatter: Send + Sync {
    async fn format(&self, query: &str) -> TypegenResult<String>;
}

/// `pg_format`, run in place against a scoped temporary file.
pub struct PgFormat {
    command: ToolCommand,
}

impl PgFormat {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

impl Default for PgFormat {
    fn default() -> Self {
        Self::new(ToolCommand::new(
            "pg_format",
            ["--inplace", "--comma-break", "--tabs"],
        ))
    }
}

#[async_trait]
impl QueryFormatter for PgFormat {
    async fn format(&self, query: &str) -> TypegenResult<String> {
        // Removed on drop, whichever way this function returns.
        let mut tmp = tempfile::Builder::new()
            .prefix("sql-")
            .suffix(".sql")
            .tempfile()
            .map_err(|e| TypegenError::tool(&self.command.program, format!("creating temp file: {}", e)))?;

        tmp.write_all(query.as_bytes())?;
        tmp.flush()?;

        let path = tmp.path().to_string_lossy().into_owned();
        self.command.run(&[path.as_str()], None).await?;

        let formatted = tokio::fs::read_to_string(tmp.path()).await.map_err(|e| {
            TypegenError::tool(&self.command.program, format!("reading formatted query: {}", e))
        })?;

        if formatted.trim().is_empty() {
            return Err(TypegenError::tool(
                &self.command.program,
                "formatter produced empty output",
            ));
        }
        Ok(formatted)
    }
}
