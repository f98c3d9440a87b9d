//! Container scanner: locates the embedded archive inside an image buffer.

/// ZIP local-file-header signature marking the start of an embedded archive.
pub const ARCHIVE_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Returns the byte offset of the first archive signature in `buffer`.
///
/// The archive is appended after the raster image's own terminator, so the
/// first match is the true archive start; the image format itself is never
/// parsed. Buffers shorter than the signature yield `None`. A match inside
/// image pixel data (adversarial input) is not detected here; the archive
/// reader's failure at that offset cascades back to the caller.
pub fn find_archive_offset(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(ARCHIVE_SIGNATURE.len())
        .position(|window| window == ARCHIVE_SIGNATURE)
}
