//! Format Registry
//!
//! Fixed table of the document categories the converter accepts. The
//! flattened extension list drives the upload filter on the page and the
//! per-file check in the convert handler.

use serde::Serialize;

use crate::converter::extension_of;

/// One category of accepted documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatCategory {
    pub label: &'static str,
    /// Human-readable format names shown on the page
    pub formats: &'static [&'static str],
    /// Lowercase extensions without the leading dot
    pub extensions: &'static [&'static str],
}

const SUPPORTED_FORMATS: &[FormatCategory] = &[
    FormatCategory {
        label: "📝 Documents",
        formats: &["Word (.docx, .doc)", "PDF", "EPub"],
        extensions: &["docx", "doc", "pdf", "epub"],
    },
    FormatCategory {
        label: "📊 Spreadsheets",
        formats: &["Excel (.xlsx, .xls)"],
        extensions: &["xlsx", "xls"],
    },
    FormatCategory {
        label: "📊 Presentations",
        formats: &["PowerPoint (.pptx, .ppt)"],
        extensions: &["pptx", "ppt"],
    },
];

/// All categories, in display order.
pub fn supported_formats() -> &'static [FormatCategory] {
    SUPPORTED_FORMATS
}

/// Every accepted extension, flattened in category order.
pub fn all_extensions() -> Vec<&'static str> {
    SUPPORTED_FORMATS
        .iter()
        .flat_map(|category| category.extensions.iter().copied())
        .collect()
}

/// Whether the filename's extension (case-insensitive) is accepted.
pub fn is_supported(filename: &str) -> bool {
    let ext = extension_of(filename);
    !ext.is_empty() && all_extensions().contains(&ext.as_str())
}

/// Value for the `accept` attribute of the upload input.
pub fn accept_attribute() -> String {
    all_extensions()
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",")
}
