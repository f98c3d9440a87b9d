//! Decode-path error types.

use thiserror::Error;

/// Result alias for decode-path operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors produced while decoding an embedded session.
///
/// All decode errors are recoverable by design: `NotFound` degrades to a
/// plain raster-image load, `CorruptArchive` is surfaced to the user as
/// "could not extract molecular data", and `NoStructureFound` offers the
/// caller a manual fallback-load action.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The buffer contains no embedded archive signature.
    #[error("no embedded archive found in container")]
    NotFound,

    /// An archive signature was present but the region is not readable.
    #[error("embedded archive is unreadable: {0}")]
    CorruptArchive(#[from] zip::result::ZipError),

    /// The archive opened but no usable structure source was established.
    #[error("no structure source could be established from the session")]
    NoStructureFound,
}

impl DecodeError {
    /// Returns `true` when the buffer should be treated as a plain image.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DecodeError::NotFound)
    }
}
