//! In-memory pointer ledger for tests and embedding.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bh_crypto::Credential;
use bh_types::{ContentAddress, Identity};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::table::PointerTable;
use crate::traits::{authorize, PointerLedger};
use crate::types::{CommitMode, CommitResult, PointerUpdate, RejectReason};

/// Call counters for an [`InMemoryPointerLedger`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub resolves: u64,
    pub commits: u64,
}

/// An in-memory implementation of [`PointerLedger`].
///
/// All pointers live in a map behind a `Mutex` and are lost when the ledger
/// is dropped. [`Self::set_available`] simulates a transport outage.
#[derive(Debug)]
pub struct InMemoryPointerLedger {
    table: Mutex<PointerTable>,
    mode: CommitMode,
    available: AtomicBool,
    resolves: AtomicU64,
    commits: AtomicU64,
}

impl InMemoryPointerLedger {
    /// A ledger with "authorize and record" semantics.
    pub fn new() -> Self {
        Self::with_mode(CommitMode::AuthorizeAndRecord)
    }

    /// A ledger that honors `commit_expecting`.
    pub fn compare_and_swap() -> Self {
        Self::with_mode(CommitMode::CompareAndSwap)
    }

    pub fn with_mode(mode: CommitMode) -> Self {
        Self {
            table: Mutex::new(PointerTable::default()),
            mode,
            available: AtomicBool::new(true),
            resolves: AtomicU64::new(0),
            commits: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> CommitMode {
        self.mode
    }

    /// Simulate the ledger going offline (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Calls served so far, including failed ones.
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            resolves: self.resolves.load(Ordering::SeqCst),
            commits: self.commits.load(Ordering::SeqCst),
        }
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, PointerTable>> {
        self.table
            .lock()
            .map_err(|e| LedgerError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn record(
        &self,
        identity: &Identity,
        expected: Option<Option<ContentAddress>>,
        address: ContentAddress,
        credential: &Credential,
    ) -> CommitResult {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if !self.is_available() {
            return CommitResult::Rejected(RejectReason::LedgerUnavailable);
        }
        if let Err(reason) = authorize(identity, &address, credential) {
            warn!(identity = %identity, %reason, "commit rejected");
            return CommitResult::Rejected(reason);
        }

        let mut table = match self.lock() {
            Ok(table) => table,
            Err(_) => return CommitResult::Rejected(RejectReason::LedgerUnavailable),
        };
        match table.advance(identity, expected, address, self.mode) {
            Ok(seq) => {
                debug!(identity = %identity, address = %address.short_hex(), seq, "pointer advanced");
                CommitResult::Accepted { seq }
            }
            Err(reason) => {
                warn!(identity = %identity, %reason, "commit rejected");
                CommitResult::Rejected(reason)
            }
        }
    }
}

impl Default for InMemoryPointerLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PointerLedger for InMemoryPointerLedger {
    async fn resolve(&self, identity: &Identity) -> LedgerResult<ContentAddress> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if !self.is_available() {
            return Err(LedgerError::Unavailable("in-memory ledger is offline".into()));
        }
        self.lock()?
            .current(identity)
            .ok_or(LedgerError::UnknownIdentity(*identity))
    }

    async fn commit(
        &self,
        identity: &Identity,
        address: ContentAddress,
        credential: &Credential,
    ) -> CommitResult {
        self.record(identity, None, address, credential)
    }

    async fn commit_expecting(
        &self,
        identity: &Identity,
        expected: Option<ContentAddress>,
        address: ContentAddress,
        credential: &Credential,
    ) -> CommitResult {
        self.record(identity, Some(expected), address, credential)
    }

    async fn history(&self, identity: &Identity) -> LedgerResult<Vec<PointerUpdate>> {
        if !self.is_available() {
            return Err(LedgerError::Unavailable("in-memory ledger is offline".into()));
        }
        Ok(self
            .lock()?
            .trail(identity)
            .map(<[PointerUpdate]>::to_vec)
            .unwrap_or_default())
    }
}
