//! The [`PointerLedger`] trait defining the ledger interface.

use async_trait::async_trait;
use bh_crypto::Credential;
use bh_types::{ContentAddress, Identity};

use crate::error::LedgerResult;
use crate::types::{CommitResult, PointerUpdate, RejectReason};

/// Ledger holding the current record pointer for each identity.
///
/// `resolve` needs no authorization. `commit` must be authorized by a
/// credential proving control of the identity (see [`authorize`]).
#[async_trait]
pub trait PointerLedger: Send + Sync {
    /// The current pointer for `identity`.
    ///
    /// Fails with `UnknownIdentity` if nothing was ever committed for it.
    async fn resolve(&self, identity: &Identity) -> LedgerResult<ContentAddress>;

    /// Authorize and record a new pointer for `identity`.
    ///
    /// This is not compare-and-swap: an authorized commit is accepted even if
    /// the pointer moved since the caller last resolved it.
    async fn commit(
        &self,
        identity: &Identity,
        address: ContentAddress,
        credential: &Credential,
    ) -> CommitResult;

    /// Commit only if the pointer still equals `expected`.
    ///
    /// Ledgers without compare-and-swap support fall back to [`Self::commit`]
    /// and ignore the expectation.
    async fn commit_expecting(
        &self,
        identity: &Identity,
        expected: Option<ContentAddress>,
        address: ContentAddress,
        credential: &Credential,
    ) -> CommitResult {
        let _ = expected;
        self.commit(identity, address, credential).await
    }

    /// Every accepted pointer move for `identity`, oldest first.
    async fn history(&self, identity: &Identity) -> LedgerResult<Vec<PointerUpdate>>;
}

/// Check that `credential` authorizes moving `identity`'s pointer to `address`.
pub fn authorize(
    identity: &Identity,
    address: &ContentAddress,
    credential: &Credential,
) -> Result<(), RejectReason> {
    if identity.is_null() {
        return Err(RejectReason::InvalidIdentity);
    }
    credential
        .verify(identity, address)
        .map_err(|_| RejectReason::Unauthorized)
}
