//! Client-side import ceilings
//!
//! All checks run synchronously on file selection, before any network call:
//! an oversized file parsed in the importing UI can freeze it, and an
//! oversized upload is wasted bandwidth the backend would reject anyway.
//! The parse-path ceilings are deliberately tighter than the upload-path
//! ceiling, which only reflects backend storage limits.

use std::path::Path;

use crate::types::ImportError;

/// Byte ceiling for the client-side parse path.
pub const MAX_PARSE_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Non-blank row ceiling for the client-side parse path.
pub const MAX_PARSE_ROWS: usize = 10_000;

/// Byte ceiling for the raw-upload path, where parsing is server-side.
pub const MAX_UPLOAD_FILE_BYTES: u64 = 25 * 1024 * 1024;

/// Extensions accepted on the raw-upload path, compared case-insensitively
/// against the final dot-segment of the filename.
pub const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["csv", "xlsx"];

/// Check the byte-size ceiling for the client-side parse path.
pub fn validate_parse_size(actual_bytes: u64) -> Result<(), ImportError> {
    if actual_bytes > MAX_PARSE_FILE_BYTES {
        return Err(ImportError::FileTooLarge {
            actual_bytes,
            limit_bytes: MAX_PARSE_FILE_BYTES,
        });
    }
    Ok(())
}

/// Check size and extension ceilings for the raw-upload path.
pub fn validate_upload(filename: &str, actual_bytes: u64) -> Result<(), ImportError> {
    let extension_ok = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ALLOWED_UPLOAD_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false);

    if !extension_ok {
        return Err(ImportError::UnsupportedExtension {
            filename: filename.to_string(),
        });
    }

    if actual_bytes > MAX_UPLOAD_FILE_BYTES {
        return Err(ImportError::FileTooLarge {
            actual_bytes,
            limit_bytes: MAX_UPLOAD_FILE_BYTES,
        });
    }

    Ok(())
}

/// Split text into non-blank lines (the unit counted by the row ceiling).
pub fn non_blank_lines(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Check the row-count ceiling for the client-side parse path.
pub fn validate_row_count(rows: &[&str]) -> Result<(), ImportError> {
    if rows.len() > MAX_PARSE_ROWS {
        return Err(ImportError::TooManyRows {
            actual: rows.len(),
            limit: MAX_PARSE_ROWS,
        });
    }
    Ok(())
}
