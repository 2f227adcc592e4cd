use bh_types::ContentAddress;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or refused service.
    #[error("content store unavailable: {0}")]
    Unavailable(String),

    /// The address is unknown to the store (possibly not yet propagated).
    #[error("record not found: {0}")]
    NotFound(ContentAddress),

    /// A record could not be encoded, or fetched bytes could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Bytes do not hash to the address they were stored or fetched under.
    #[error("hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch {
        expected: ContentAddress,
        computed: ContentAddress,
    },

    /// I/O error from a filesystem backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for a not-found error, which may be transient right
    /// after a `put`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
