// Media operation layer
//
// - Commands: argument list builders for ffmpeg and the process executor
// - Runner: the four operations (extract, concatenate, trim, split)
//
// Every external process is spawned through `CommandExecutor`, so the
// operations can be exercised without ffmpeg installed.

pub mod commands;
pub mod runner;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use runner::*;

use crate::error::{ClipdeckError, Result};

/// Captured result of one external tool invocation
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn new(code: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// Turn a non-zero exit into an `ExternalTool` error carrying stderr
    pub fn check(self, description: &str) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }

        Err(ClipdeckError::ExternalTool {
            description: description.to_string(),
            status: self.status_text(),
            stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
        })
    }
}

/// Spawns external tool processes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run the command to completion and capture its output.
    ///
    /// Only a failure to spawn is an error here; exit status is left to the
    /// caller.
    async fn run(&self, command: &MediaCommand) -> Result<CommandOutput>;
}

/// Borrow a path as UTF-8 text for an argument list or manifest line
pub fn path_text(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        ClipdeckError::Encoding(format!("Path is not valid UTF-8: {}", path.display()))
    })
}
