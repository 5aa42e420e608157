//! Errors raised by durable storage backends.
//!
//! These never escape the scroll-position store: it logs them and carries on as if nothing
//! had been saved.

/// A failure reading, writing or decoding persisted scroll state.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The medium cannot be used at all (e.g. privacy mode, missing permissions).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The write would exceed the medium's quota.
    #[error("storage quota exceeded writing {key} ({bytes} bytes)")]
    QuotaExceeded { key: String, bytes: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scroll document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document was written by a newer schema than this build understands.
    #[error("unsupported scroll document version {0}")]
    UnsupportedVersion(u64),
}

pub type Result<T> = std::result::Result<T, StorageError>;
