use async_trait::async_trait;
use bh_types::ContentAddress;

use crate::error::{StoreError, StoreResult};

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - Blobs are immutable once written. The same bytes always produce the
///   same address, and an address always resolves to the same bytes.
/// - `put_bytes` is idempotent.
/// - A successful `put_bytes` makes the address resolvable eventually; a
///   reader other than the writer may briefly see `NotFound`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a blob and return its content address.
    async fn put_bytes(&self, bytes: Vec<u8>) -> StoreResult<ContentAddress>;

    /// Fetch the blob stored under `address`.
    ///
    /// Returns `StoreError::NotFound` if the address is unknown at call time.
    async fn get_bytes(&self, address: &ContentAddress) -> StoreResult<Vec<u8>>;

    /// Check whether an address currently resolves.
    async fn contains(&self, address: &ContentAddress) -> StoreResult<bool> {
        match self.get_bytes(address).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
