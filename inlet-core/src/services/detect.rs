//! File detection service - encoding sniff and structural validation
//!
//! Runs before any parser: rejects zero-byte and oversized files and files
//! whose bytes contradict their extension (a .csv that is really a ZIP, a
//! .pdf without a PDF header). Read-only; recoverable problems come back as
//! structured errors, only I/O-level faults propagate as Err.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Default upload ceiling: 10 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Basic facts about an upload candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub extension: String,
    pub size: u64,
    pub mime: Option<String>,
}

/// Pre-parse validation and sniffing
pub struct FileDetector {
    max_file_size: u64,
    mime_map: HashMap<&'static str, &'static str>,
}

impl FileDetector {
    pub fn new(max_file_size: u64) -> Self {
        let mime_map = HashMap::from([
            ("csv", "text/csv"),
            ("pdf", "application/pdf"),
            ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            ("xls", "application/vnd.ms-excel"),
            ("ofx", "application/x-ofx"),
            ("qfx", "application/x-ofx"),
            ("qif", "application/x-qif"),
        ]);
        Self {
            max_file_size,
            mime_map,
        }
    }

    /// MIME type for a lowercase extension, when it is one we accept
    pub fn mime_for_extension(&self, extension: &str) -> Option<&'static str> {
        self.mime_map
            .get(extension.trim_start_matches('.').to_lowercase().as_str())
            .copied()
    }

    /// Name, extension, size and mapped MIME for a file on disk
    pub fn get_file_info(&self, path: &Path) -> Result<FileInfo> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        let mime = self.mime_for_extension(&extension).map(|m| m.to_string());
        Ok(FileInfo {
            name,
            extension,
            size: metadata.len(),
            mime,
        })
    }

    /// Sniff the text encoding from the leading bytes: BOMs first, then a
    /// UTF-8 validity check, with windows-1252 as the legacy fallback.
    pub fn detect_encoding(&self, path: &Path) -> Result<&'static str> {
        let bytes = read_head(path, 8192)?;
        Ok(detect_encoding_of(&bytes))
    }

    /// Structural validation; returns `(is_valid, errors)` and never fails
    /// for recoverable problems
    pub fn validate_file(&self, path: &Path) -> Result<(bool, Vec<String>)> {
        let mut errors = Vec::new();

        let info = self.get_file_info(path)?;
        if info.size == 0 {
            errors.push("file is empty".to_string());
            return Ok((false, errors));
        }
        if info.size > self.max_file_size {
            errors.push(format!(
                "file is {} bytes, exceeding the {} byte limit",
                info.size, self.max_file_size
            ));
        }
        if info.extension.is_empty() {
            errors.push("file has no extension".to_string());
        } else if self.mime_for_extension(&info.extension).is_none() {
            errors.push(format!("unsupported file extension: .{}", info.extension));
        }

        let head = read_head(path, 8192)?;
        if let Some(problem) = content_mismatch(&info.extension, &head) {
            errors.push(problem);
        }

        Ok((errors.is_empty(), errors))
    }
}

impl Default for FileDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}

fn read_head(path: &Path, limit: usize) -> Result<Vec<u8>> {
    use std::io::Read;
    let mut file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; limit];
    let n = file.read(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}

fn detect_encoding_of(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return "utf-8-sig";
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return "utf-16-le";
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return "utf-16-be";
    }
    if std::str::from_utf8(trim_partial_utf8(bytes)).is_ok() {
        "utf-8"
    } else {
        "windows-1252"
    }
}

/// Drop a trailing partial multi-byte sequence cut off by the read window
fn trim_partial_utf8(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && end > bytes.len().saturating_sub(4) && bytes[end - 1] & 0xC0 == 0x80 {
        end -= 1;
    }
    if end > 0 && bytes[end - 1] >= 0xC0 {
        end -= 1;
    }
    &bytes[..end]
}

/// Check the leading bytes against what the extension promises
fn content_mismatch(extension: &str, head: &[u8]) -> Option<String> {
    match extension {
        "pdf" => {
            if !head.starts_with(PDF_MAGIC) {
                return Some("extension is .pdf but content has no PDF header".to_string());
            }
        }
        "xlsx" => {
            if !head.starts_with(ZIP_MAGIC) {
                return Some("extension is .xlsx but content is not a ZIP container".to_string());
            }
        }
        "xls" => {
            if !head.starts_with(OLE2_MAGIC) && !head.starts_with(ZIP_MAGIC) {
                return Some("extension is .xls but content is not a spreadsheet".to_string());
            }
        }
        // Text formats must not be binary containers
        "csv" | "ofx" | "qfx" | "qif" => {
            if head.starts_with(ZIP_MAGIC) {
                return Some(format!(
                    "extension is .{extension} but content is a ZIP/Office container"
                ));
            }
            if head.starts_with(OLE2_MAGIC) {
                return Some(format!(
                    "extension is .{extension} but content is a binary document"
                ));
            }
            if head.starts_with(PDF_MAGIC) {
                return Some(format!("extension is .{extension} but content is a PDF"));
            }
            // NUL bytes mean binary, unless it is a UTF-16 text file
            let utf16 = head.starts_with(&[0xFF, 0xFE]) || head.starts_with(&[0xFE, 0xFF]);
            if !utf16 && head.contains(&0u8) {
                return Some(format!("extension is .{extension} but content is binary"));
            }
        }
        _ => {}
    }
    None
}
