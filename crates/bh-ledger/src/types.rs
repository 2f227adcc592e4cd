//! Commit outcomes and audit records.

use std::fmt;

use bh_types::ContentAddress;
use serde::{Deserialize, Serialize};

/// Why a ledger refused to advance a pointer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The credential does not prove control of the identity.
    Unauthorized,
    /// The ledger could not be reached while committing.
    LedgerUnavailable,
    /// The identity is not acceptable to the ledger (e.g. the null identity).
    InvalidIdentity,
    /// Compare-and-swap only: the pointer moved since the caller read it.
    Conflict { current: Option<ContentAddress> },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::LedgerUnavailable => write!(f, "ledger unavailable"),
            Self::InvalidIdentity => write!(f, "invalid identity"),
            Self::Conflict { current: Some(c) } => {
                write!(f, "conflict: pointer is now {}", c.short_hex())
            }
            Self::Conflict { current: None } => write!(f, "conflict: pointer is unset"),
        }
    }
}

/// Outcome of a pointer commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitResult {
    /// The pointer now names the committed address. `seq` is its position
    /// in the identity's audit trail (1-based).
    Accepted { seq: u64 },
    /// The pointer is unchanged.
    Rejected(RejectReason),
}

impl CommitResult {
    /// Returns `true` if the commit was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// One accepted pointer move, as kept in the audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerUpdate {
    /// Position in the identity's trail (1-based, monotonic).
    pub seq: u64,
    /// The address the pointer moved to.
    pub address: ContentAddress,
    /// The address it moved from, if any.
    pub previous: Option<ContentAddress>,
}

/// How a ledger arbitrates commits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitMode {
    /// Accept any authorized commit; the last one wins.
    #[default]
    AuthorizeAndRecord,
    /// Honor `commit_expecting`: reject when the pointer moved.
    CompareAndSwap,
}
