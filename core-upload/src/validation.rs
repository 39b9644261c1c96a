//! File acceptance rules applied before an entry is created.

use core_documents::UploadFile;
use core_runtime::config::UploadSettings;
use core_runtime::logging::strip_path;
use std::collections::HashSet;

use crate::error::{Result, UploadError};

const OCTET_STREAM: &str = "application/octet-stream";

/// Lowercased MIME type without parameters (`"Text/XML; charset=utf-8"` → `"text/xml"`).
pub fn normalize_content_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn content_type_for_extension(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        "xml" => "application/xml",
        _ => OCTET_STREAM,
    }
}

/// Allow-list built from [`UploadSettings`].
#[derive(Debug, Clone)]
pub struct FileValidator {
    content_types: HashSet<String>,
    extensions: HashSet<String>,
    max_size: u64,
}

impl FileValidator {
    pub fn new(settings: &UploadSettings) -> Self {
        Self {
            content_types: settings
                .accepted_content_types
                .iter()
                .map(|t| normalize_content_type(t))
                .collect(),
            extensions: settings
                .accepted_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_size: settings.max_file_size_bytes,
        }
    }

    /// Check `file` and return the content type it should be uploaded with.
    ///
    /// The extension is only consulted when the host could not tell the type
    /// (empty or `application/octet-stream`).
    pub fn validate(&self, file: &UploadFile) -> Result<String> {
        let declared = normalize_content_type(&file.content_type);

        let resolved = if declared.is_empty() || declared == OCTET_STREAM {
            extension_of(&file.file_name)
                .filter(|ext| self.extensions.contains(ext))
                .map(|ext| content_type_for_extension(&ext).to_string())
        } else if self.content_types.contains(&declared) {
            Some(declared.clone())
        } else {
            None
        };

        let content_type = resolved.ok_or_else(|| UploadError::InvalidFileType {
            file_name: strip_path(&file.file_name).to_string(),
            content_type: if declared.is_empty() {
                "unknown".to_string()
            } else {
                declared
            },
        })?;

        if file.size() > self.max_size {
            return Err(UploadError::FileTooLarge {
                file_name: strip_path(&file.file_name).to_string(),
                size: file.size(),
                max: self.max_size,
            });
        }

        Ok(content_type)
    }
}
