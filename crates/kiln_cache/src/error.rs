//! Error types for cache persistence and decoding.

use std::path::PathBuf;

use kiln_common::InternalError;

/// Errors raised while restoring a cache from its binary form.
///
/// A decode error is never a cache miss: the blob is unusable as a whole.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Fewer than eight bytes, so the metadata length is missing.
    #[error("truncated cache blob: {len} bytes, expected at least 8")]
    TruncatedPrefix {
        /// Total blob length.
        len: usize,
    },

    /// The declared metadata length exceeds the blob.
    #[error("metadata length {declared} exceeds the {available} bytes available")]
    MetadataOutOfBounds {
        /// Length from the prefix.
        declared: u64,
        /// Bytes after the prefix.
        available: usize,
    },

    /// The metadata is not UTF-8.
    #[error("cache metadata is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The metadata is not valid JSON or lacks required fields.
    #[error("invalid cache metadata: {0}")]
    InvalidMetadata(#[from] serde_json::Error),

    /// `entries` and `shaderCreationParams` differ in length.
    #[error("{entries} entries but {params} shader creation params")]
    LengthMismatch {
        /// Number of entries.
        entries: usize,
        /// Number of shader creation params.
        params: usize,
    },

    /// A code range overflows or lies outside the code region.
    #[error("code range of entry {index} ({offset}+{size}) exceeds the {region}-byte code region")]
    CodeOutOfBounds {
        /// Entry position.
        index: usize,
        /// Declared offset into the code region.
        offset: u64,
        /// Declared code size.
        size: u64,
        /// Size of the code region.
        region: usize,
    },

    /// A code range starts before the previous entry's range ends.
    #[error("code range of entry {index} at offset {offset} overlaps the previous range ending at {previous_end}")]
    CodeOverlap {
        /// Entry position.
        index: usize,
        /// Declared offset into the code region.
        offset: u64,
        /// End of the previous entry's range.
        previous_end: u64,
    },
}

/// Errors from loading or saving a cache file.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error on the cache file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache file could not be decoded.
    #[error("failed to decode shader cache: {0}")]
    Decode(#[from] DecodeError),

    /// The cache could not be encoded.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from(".kiln/shader_cache.bin"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("shader_cache.bin"));
    }

    #[test]
    fn decode_error_wraps() {
        let err: CacheError = DecodeError::TruncatedPrefix { len: 3 }.into();
        assert_eq!(
            err.to_string(),
            "failed to decode shader cache: truncated cache blob: 3 bytes, expected at least 8"
        );
    }

    #[test]
    fn overlap_display() {
        let err = DecodeError::CodeOverlap {
            index: 2,
            offset: 4,
            previous_end: 8,
        };
        assert!(err.to_string().contains("overlaps the previous range ending at 8"));
    }
}
