//! Upload-artifact assembly for captured sessions.

use std::time::{SystemTime, UNIX_EPOCH};

/// Content type of a captured session container.
pub const ARTIFACT_MIME: &str = "image/png";

/// A captured export, ready for the upload collaborator.
///
/// Created only by the capture protocol and not retained after upload.
#[derive(Debug, Clone)]
pub struct CapturedArtifact {
    /// The freshly generated session container bytes.
    pub bytes: Vec<u8>,
    /// Upload file name, `<sanitized_model_name>_<timestamp>.<ext>`.
    pub suggested_file_name: String,
    /// Always [`ARTIFACT_MIME`] for session containers.
    pub mime_type: String,
}

/// Builds the upload file name for a model exported now.
pub fn export_file_name(model_name: &str, extension: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    file_name_at(model_name, extension, timestamp)
}

fn file_name_at(model_name: &str, extension: &str, timestamp: u64) -> String {
    format!("{}_{timestamp}.{extension}", sanitize_model_name(model_name))
}

/// Collapses anything outside `[A-Za-z0-9._-]` to `_`; an all-filtered or
/// empty name falls back to a fixed stem so the artifact always has one.
fn sanitize_model_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '_' || c == '.') {
        "session".to_string()
    } else {
        sanitized
    }
}
