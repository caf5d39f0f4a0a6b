//! Converter Adapter
//!
//! Wraps one call into a document-to-Markdown engine. The engines work on
//! filesystem paths, so every call spills the uploaded bytes into a scoped
//! temporary file tagged with the original extension, hands the path to the
//! backend, and removes the file before returning on every exit path.
//!
//! Faults never escape this module: [`Converter::convert`] folds them into
//! [`ConversionResult::Failed`] carrying the fault's text.

pub mod markitdown;
pub mod native;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::{BackendKind, ConverterConfig};

pub use markitdown::MarkItDownBackend;
pub use native::NativeBackend;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Tool {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("conversion timed out after {0}s")]
    Timeout(u64),

    #[error("unsupported file extension: '{0}'")]
    Unsupported(String),

    #[error("{0}")]
    Parse(String),
}

/// Outcome of converting one file. Exactly one of text or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionResult {
    Converted { markdown: String },
    Failed { error: String },
}

impl ConversionResult {
    pub fn is_converted(&self) -> bool {
        matches!(self, ConversionResult::Converted { .. })
    }
}

/// A conversion engine that reads a document from disk.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn convert_path(&self, path: &Path) -> Result<String, ConvertError>;
}

/// Lowercased text after the last `.`, or empty when there is none.
pub fn extension_of(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Temporary copy of an upload. Removed on drop; `remove` surfaces removal errors.
struct ScopedTempFile {
    file: NamedTempFile,
}

impl ScopedTempFile {
    fn create(dir: Option<&Path>, extension: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let suffix = format!(".{}", extension);
        let mut builder = tempfile::Builder::new();
        builder.prefix("office-md-").suffix(&suffix);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self { file })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }

    fn remove(self) -> std::io::Result<()> {
        self.file.close()
    }
}

#[derive(Clone)]
pub struct Converter {
    backend: Arc<dyn DocumentBackend>,
    temp_dir: Option<PathBuf>,
}

impl Converter {
    pub fn new(backend: Arc<dyn DocumentBackend>, temp_dir: Option<PathBuf>) -> Self {
        Self { backend, temp_dir }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        let backend: Arc<dyn DocumentBackend> = match config.backend {
            BackendKind::MarkItDown => Arc::new(MarkItDownBackend::new(
                config.markitdown_bin.clone(),
                config.timeout_secs,
            )),
            BackendKind::Native => Arc::new(NativeBackend),
        };
        Self::new(backend, config.temp_dir.clone())
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Convert one uploaded file. Never fails; faults come back as `Failed`.
    pub async fn convert(&self, file_bytes: &[u8], filename: &str) -> ConversionResult {
        match self.try_convert(file_bytes, filename).await {
            Ok(markdown) => ConversionResult::Converted { markdown },
            Err(e) => {
                warn!(filename = %filename, backend = self.backend.name(), error = %e, "Conversion failed");
                ConversionResult::Failed { error: e.to_string() }
            }
        }
    }

    async fn try_convert(&self, file_bytes: &[u8], filename: &str) -> Result<String, ConvertError> {
        let extension = extension_of(filename);
        let temp = ScopedTempFile::create(self.temp_dir.as_deref(), &extension, file_bytes)?;
        debug!(
            filename = %filename,
            bytes = file_bytes.len(),
            path = %temp.path().display(),
            "Spilled upload to temporary file"
        );

        // An early return drops `temp`, which deletes the file.
        let markdown = self.backend.convert_path(temp.path()).await?;
        temp.remove()?;

        Ok(markdown)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted backend for exercising the adapter and everything above it.

    use super::*;
    use std::sync::Mutex;

    /// Bytes starting with this marker make the stub backend fail.
    pub const FAIL_MARKER: &[u8] = b"%CORRUPT%";

    #[derive(Debug, Clone)]
    pub struct SeenPath {
        pub path: PathBuf,
        pub existed_during_call: bool,
    }

    /// Returns the file body as Markdown, or a parse fault for `FAIL_MARKER` payloads.
    #[derive(Default)]
    pub struct StubBackend {
        pub seen: Mutex<Vec<SeenPath>>,
    }

    impl StubBackend {
        pub fn seen_paths(&self) -> Vec<SeenPath> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn convert_path(&self, path: &Path) -> Result<String, ConvertError> {
            self.seen.lock().unwrap().push(SeenPath {
                path: path.to_path_buf(),
                existed_during_call: path.exists(),
            });

            let bytes = tokio::fs::read(path).await?;
            if bytes.starts_with(FAIL_MARKER) {
                return Err(ConvertError::Parse(
                    "File is not a zip file".to_string(),
                ));
            }
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    pub fn stub_converter() -> (Converter, Arc<StubBackend>) {
        let backend = Arc::new(StubBackend::default());
        (Converter::new(backend.clone(), None), backend)
    }
}
