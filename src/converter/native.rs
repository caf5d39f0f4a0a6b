//! In-process backend for PDFs and spreadsheets.
//!
//! PDF text comes from `lopdf`, one section per page. Workbooks go through
//! `calamine`, one Markdown table per sheet with the first row as header.
//! Anything else is reported as unsupported.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Range, Reader};
use lopdf::Document;

use super::{extension_of, ConvertError, DocumentBackend};

pub struct NativeBackend;

#[async_trait]
impl DocumentBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn convert_path(&self, path: &Path) -> Result<String, ConvertError> {
        let extension = path
            .file_name()
            .map(|name| extension_of(&name.to_string_lossy()))
            .unwrap_or_default();
        let path: PathBuf = path.to_path_buf();

        let task = match extension.as_str() {
            "pdf" => tokio::task::spawn_blocking(move || pdf_to_markdown(&path)),
            "xlsx" | "xls" => tokio::task::spawn_blocking(move || workbook_to_markdown(&path)),
            _ => return Err(ConvertError::Unsupported(extension)),
        };

        task.await
            .map_err(|e| ConvertError::Parse(format!("conversion task failed: {}", e)))?
    }
}

fn pdf_to_markdown(path: &Path) -> Result<String, ConvertError> {
    let document = Document::load(path).map_err(|e| ConvertError::Parse(e.to_string()))?;

    let mut markdown = String::new();
    for page_number in document.get_pages().keys() {
        let text = document
            .extract_text(&[*page_number])
            .map_err(|e| ConvertError::Parse(e.to_string()))?;

        if !markdown.is_empty() {
            markdown.push_str("\n\n");
        }
        markdown.push_str(&format!("<!-- Page {} -->\n\n", page_number));
        markdown.push_str(text.trim());
    }

    Ok(markdown)
}

fn workbook_to_markdown(path: &Path) -> Result<String, ConvertError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ConvertError::Parse(e.to_string()))?;

    let mut markdown = String::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ConvertError::Parse(format!("failed to read sheet '{}': {}", name, e)))?;

        if !markdown.is_empty() {
            markdown.push_str("\n\n");
        }
        markdown.push_str(&format!("## {}\n\n", name));
        markdown.push_str(&range_to_table(&range));
    }

    Ok(markdown)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => escape_cell(&other.to_string()),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace("\r\n", " ").replace('\n', " ")
}

fn rows_to_table(rows: &[Vec<String>]) -> String {
    let Some(width) = rows.iter().map(Vec::len).max().filter(|w| *w > 0) else {
        return "_Empty sheet_".to_string();
    };

    let line = |row: &Vec<String>| {
        let mut cells: Vec<&str> = row.iter().map(String::as_str).collect();
        cells.resize(width, "");
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(line(&rows[0]));
    lines.push(format!("|{}", " --- |".repeat(width)));
    lines.extend(rows[1..].iter().map(line));
    lines.join("\n")
}

fn range_to_table(range: &Range<Data>) -> String {
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    rows_to_table(&rows)
}
