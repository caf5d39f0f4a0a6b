//! External `markitdown` backend.
//!
//! Runs the program once per file with the document path as its only
//! argument and reads the Markdown from stdout. `--use-plugins` is never
//! passed, so third-party converter plugins stay unloaded.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{ConvertError, DocumentBackend};

/// Keep at most this much of stderr in a fault message.
const MAX_STDERR_CHARS: usize = 1000;

pub struct MarkItDownBackend {
    program: String,
    timeout_secs: u64,
}

impl MarkItDownBackend {
    pub fn new(program: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            timeout_secs,
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    text.chars().skip(count - max).collect()
}

#[async_trait]
impl DocumentBackend for MarkItDownBackend {
    fn name(&self) -> &'static str {
        "markitdown"
    }

    async fn convert_path(&self, path: &Path) -> Result<String, ConvertError> {
        debug!(program = %self.program, path = %path.display(), "Running markitdown");

        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.command(path).output(),
        )
        .await
        .map_err(|_| ConvertError::Timeout(self.timeout_secs))?
        .map_err(|source| ConvertError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConvertError::Tool {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: tail_chars(stderr.trim(), MAX_STDERR_CHARS),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
