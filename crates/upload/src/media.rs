//! Media file checks applied before an upload session is opened.

use std::path::Path;

use crate::error::UploadError;

/// Containers the transcoding pipeline accepts, with their display names.
pub const SUPPORTED_EXTENSIONS: &[(&str, &str)] = &[
    ("mp4", "MP4"),
    ("mov", "MOV"),
    ("avi", "AVI"),
    ("mkv", "MKV"),
    ("webm", "WebM"),
    ("flv", "FLV"),
    ("mpeg", "MPEG"),
    ("mpg", "MPEG"),
    ("3gp", "3GP"),
    ("wmv", "WMV"),
    ("m4v", "M4V"),
];

/// Largest file accepted for upload: 100 GiB.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024 * 1024;

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Display name of the file's container, e.g. `WebM`.
///
/// Unknown extensions are upper-cased; files without one yield an empty
/// string.
pub fn format_name(path: &Path) -> String {
    let Some(ext) = extension(path) else {
        return String::new();
    };
    SUPPORTED_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| ext.to_ascii_uppercase())
}

/// Comma-separated list of supported formats, without repeats.
pub fn supported_formats() -> String {
    let mut names: Vec<&str> = Vec::new();
    for (_, name) in SUPPORTED_EXTENSIONS {
        if !names.contains(name) {
            names.push(*name);
        }
    }
    names.join(", ")
}

/// Rejects files that are empty, too large or not a supported container.
pub fn validate_media_file(path: &Path, size: u64) -> Result<(), UploadError> {
    let supported = extension(path)
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.iter().any(|(e, _)| *e == ext));
    if !supported {
        return Err(UploadError::Validation(format!(
            "unsupported video format: {} (supported: {})",
            path.display(),
            supported_formats()
        )));
    }
    if size == 0 {
        return Err(UploadError::Validation(format!(
            "file is empty: {}",
            path.display()
        )));
    }
    if size > MAX_FILE_SIZE {
        return Err(UploadError::Validation(format!(
            "file is {size} bytes, the limit is {MAX_FILE_SIZE} bytes"
        )));
    }
    Ok(())
}
