//! Go toolchain collaborators: source normalization and import resolution.

use std::path::Path;

use async_trait::async_trait;

use crate::error::TypegenResult;
use crate::process::ToolCommand;

#[async_trait]
pub trait GoTools: Send + Sync {
    /// Normalize formatting of a whole Go file.
    async fn gofmt(&self, source: &str) -> TypegenResult<String>;

    /// Add missing and drop unused imports of a file that will live at `path`.
    async fn goimports(&self, path: &Path, source: &str) -> TypegenResult<String>;
}

/// The real `gofmt` / `goimports` binaries, fed over stdin.
pub struct GoToolchain {
    gofmt: Option<ToolCommand>,
    goimports: ToolCommand,
}

impl GoToolchain {
    /// `gofmt: None` skips normalization.
    pub fn new(gofmt: Option<ToolCommand>, goimports: ToolCommand) -> Self {
        Self { gofmt, goimports }
    }
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new(
            Some(ToolCommand::new("gofmt", Vec::<String>::new())),
            ToolCommand::new("goimports", Vec::<String>::new()),
        )
    }
}

#[async_trait]
impl GoTools for GoToolchain {
    async fn gofmt(&self, source: &str) -> TypegenResult<String> {
        match &self.gofmt {
            Some(cmd) => cmd.run(&[], Some(source)).await,
            None => Ok(source.to_string()),
        }
    }

    async fn goimports(&self, path: &Path, source: &str) -> TypegenResult<String> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let dir = dir.to_string_lossy();
        self.goimports
            .run(&["-srcdir", dir.as_ref()], Some(source))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gofmt_disabled_passes_through() {
        let tools = GoToolchain::new(None, ToolCommand::new("goimports", Vec::<String>::new()));
        let src = "package p\nfunc  f(){}\n";
        assert_eq!(tools.gofmt(src).await.unwrap(), src);
    }
}
