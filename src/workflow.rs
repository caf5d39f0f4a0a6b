//! Workflow Controller
//!
//! Runs one conversion batch against a session's store and renders the
//! store back out as download artifacts and previews.

use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument};

use crate::converter::{ConversionResult, Converter};
use crate::session::SessionStore;

/// Characters of Markdown shown in a preview.
pub const PREVIEW_LIMIT: usize = 2000;

pub const TRUNCATION_NOTICE: &str =
    "...\n\n(Preview truncated. Download the full file to see all content.)";

pub const NO_FILES_MESSAGE: &str = "Please upload at least one file";

/// A file as received from the upload boundary.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// User-visible message produced while handling a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    Validation { message: String },
    Converted { filename: String },
    Failed { filename: String, error: String },
}

impl Notice {
    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::Converted { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Notice::Validation { message } => message.clone(),
            Notice::Converted { filename } => format!("Converted {} successfully!", filename),
            Notice::Failed { filename, error } => {
                format!("Error converting {}: {}", filename, error)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub notices: Vec<Notice>,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.notices
            .iter()
            .filter(|n| matches!(n, Notice::Converted { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.notices
            .iter()
            .filter(|n| matches!(n, Notice::Failed { .. }))
            .count()
    }
}

/// One stored conversion as shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEntry {
    pub filename: String,
    pub download_name: String,
    pub preview: String,
    pub truncated: bool,
    pub char_count: usize,
}

/// Replace the last extension with `.md`; names without one just gain `.md`.
pub fn download_name(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);
    format!("{}.md", stem)
}

/// First `PREVIEW_LIMIT` characters, plus the truncation notice when cut.
pub fn preview(markdown: &str) -> (String, bool) {
    match markdown.char_indices().nth(PREVIEW_LIMIT) {
        Some((cut, _)) => {
            let mut text = markdown[..cut].to_string();
            text.push_str(TRUNCATION_NOTICE);
            (text, true)
        }
        None => (markdown.to_string(), false),
    }
}

pub struct WorkflowController<'a> {
    converter: &'a Converter,
}

impl<'a> WorkflowController<'a> {
    pub fn new(converter: &'a Converter) -> Self {
        Self { converter }
    }

    /// Convert every file in order, storing successes. A failed file is
    /// reported and skipped; the rest of the batch still runs.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn run_batch(&self, store: &mut SessionStore, files: Vec<UploadedFile>) -> BatchReport {
        if files.is_empty() {
            return BatchReport {
                notices: vec![Notice::Validation {
                    message: NO_FILES_MESSAGE.to_string(),
                }],
            };
        }

        let mut report = BatchReport::default();
        for file in files {
            info!(filename = %file.name, bytes = file.content.len(), "Converting to Markdown");

            let notice = match self.converter.convert(&file.content, &file.name).await {
                ConversionResult::Converted { markdown } => {
                    store.put(file.name.clone(), markdown);
                    Notice::Converted { filename: file.name }
                }
                ConversionResult::Failed { error } => Notice::Failed {
                    filename: file.name,
                    error,
                },
            };
            report.notices.push(notice);
        }

        info!(
            converted = report.converted(),
            failed = report.failed(),
            "Batch finished"
        );
        report
    }
}

pub fn render(store: &SessionStore) -> Vec<RenderedEntry> {
    store
        .get_all()
        .map(|(filename, markdown)| {
            let (preview, truncated) = preview(markdown);
            RenderedEntry {
                filename: filename.to_string(),
                download_name: download_name(filename),
                preview,
                truncated,
                char_count: markdown.chars().count(),
            }
        })
        .collect()
}
