use bh_ledger::{LedgerError, RejectReason};
use bh_session::IdentityError;
use bh_store::StoreError;
use bh_types::{ContentAddress, ValidationError};
use thiserror::Error;

use crate::state::UpdateState;

/// The lower-layer cause of a failed invocation.
#[derive(Debug, Error)]
pub enum FailureReason {
    #[error("identity: {0}")]
    Identity(#[from] IdentityError),

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    /// `register` found an existing pointer for the identity.
    #[error("identity is already registered at {}", .0.short_hex())]
    AlreadyRegistered(ContentAddress),

    /// The ledger refused the commit. The stored document is orphaned.
    #[error("commit rejected: {0}")]
    Rejected(RejectReason),
}

/// A failed invocation, tagged with the state it failed in.
#[derive(Debug, Error)]
#[error("failed while {state}: {reason}")]
pub struct UpdateError {
    pub state: UpdateState,
    #[source]
    pub reason: FailureReason,
}

impl UpdateError {
    pub fn new(state: UpdateState, reason: impl Into<FailureReason>) -> Self {
        Self {
            state,
            reason: reason.into(),
        }
    }

    /// The rejection reason, if the ledger refused the commit.
    pub fn rejection(&self) -> Option<&RejectReason> {
        match &self.reason {
            FailureReason::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

pub type UpdateResult<T> = Result<T, UpdateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bh_types::Identity;

    #[test]
    fn display_names_state() {
        let err = UpdateError::new(UpdateState::Resolving, LedgerError::Unavailable("down".into()));
        assert_eq!(err.to_string(), "failed while Resolving: ledger: ledger unavailable: down");
        assert!(err.rejection().is_none());
    }

    #[test]
    fn already_registered_display() {
        let address = ContentAddress::from_hash([0xab; 32]);
        let err = UpdateError::new(UpdateState::Resolving, FailureReason::AlreadyRegistered(address));
        assert_eq!(
            err.to_string(),
            format!("failed while Resolving: identity is already registered at {}", address.short_hex())
        );
    }

    #[test]
    fn rejection_accessor() {
        let err = UpdateError::new(
            UpdateState::Committing,
            FailureReason::Rejected(RejectReason::Unauthorized),
        );
        assert_eq!(err.rejection(), Some(&RejectReason::Unauthorized));
        let other = UpdateError::new(
            UpdateState::Connecting,
            IdentityError::NotControlled(Identity::null()),
        );
        assert!(other.rejection().is_none());
    }
}
