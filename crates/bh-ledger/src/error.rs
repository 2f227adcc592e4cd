//! Error types for ledger reads.

use bh_types::Identity;
use thiserror::Error;

/// Errors from resolving pointers or reading the audit trail.
///
/// Commit failures are not errors: they come back as
/// [`crate::CommitResult::Rejected`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No pointer has ever been committed for this identity.
    #[error("unknown identity: {0}")]
    UnknownIdentity(Identity),

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger's persisted state could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a file-backed ledger.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
