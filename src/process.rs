//! External tool invocation.

use std::process::Stdio;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::error::{TypegenError, TypegenResult};

/// A program plus its fixed leading arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Shared cap on concurrently running tools.
    #[serde(skip)]
    limit: Option<Arc<Semaphore>>,
}

impl ToolCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Arc<Semaphore>) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Run with extra trailing arguments, optionally feeding stdin, and
    /// return stdout.
    pub async fn run(&self, extra: &[&str], stdin: Option<&str>) -> TypegenResult<String> {
        let _permit = match &self.limit {
            Some(sem) => Some(
                sem.acquire()
                    .await
                    .map_err(|e| TypegenError::tool(&self.program, e.to_string()))?,
            ),
            None => None,
        };

        tracing::debug!(program = %self.program, args = ?self.args, ?extra, "running tool");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(extra)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    TypegenError::tool(&self.program, "executable not found in PATH")
                }
                _ => TypegenError::tool(&self.program, e.to_string()),
            })?;

        if let Some(input) = stdin
            && let Some(mut pipe) = child.stdin.take()
        {
            pipe.write_all(input.as_bytes()).await?;
            // Close stdin so the tool sees EOF.
            drop(pipe);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TypegenError::tool(
                &self.program,
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| TypegenError::tool(&self.program, format!("non-UTF-8 output: {}", e)))
    }
}
