//! JSON-file pointer ledger for local, single-machine use.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bh_crypto::Credential;
use bh_types::{ContentAddress, Identity};
use fs4::fs_std::FileExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::table::{PointerTable, TrailRecord};
use crate::traits::{authorize, PointerLedger};
use crate::types::{CommitMode, CommitResult, PointerUpdate, RejectReason};

/// A [`PointerLedger`] persisted as a single JSON file.
///
/// Every operation re-reads the file, so separate handles and processes
/// sharing the file observe each other's commits. Writes replace the file
/// atomically via rename, so reads need no lock.
///
/// A commit holds an exclusive advisory lock on `<path>.lock` across its
/// read-modify-write, so concurrent committers never drop each other's trail
/// entries. The lock does not make `commit` a compare-and-swap: a commit
/// still lands on whatever pointer is current when it gets the lock.
#[derive(Debug)]
pub struct FilePointerLedger {
    path: PathBuf,
    lock_path: PathBuf,
    mode: CommitMode,
    io: Mutex<()>,
}

impl FilePointerLedger {
    /// Open a ledger file, creating its parent directory if needed.
    ///
    /// A missing file is an empty ledger.
    pub async fn open(path: impl Into<PathBuf>, mode: CommitMode) -> LedgerResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        Ok(Self {
            path,
            lock_path: lock_path.into(),
            mode,
            io: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> LedgerResult<PointerTable> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let records: Vec<TrailRecord> = serde_json::from_slice(&bytes)
                    .map_err(|e| LedgerError::Serialization(e.to_string()))?;
                Ok(PointerTable::from_records(records))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(PointerTable::default()),
            Err(e) => Err(LedgerError::Io(e)),
        }
    }

    /// Block until this handle holds the cross-process commit lock.
    ///
    /// The lock is released when the returned file is dropped.
    async fn acquire_commit_lock(&self) -> LedgerResult<File> {
        let path = self.lock_path.clone();
        tokio::task::spawn_blocking(move || -> LedgerResult<File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| LedgerError::Unavailable(format!("lock task failed: {e}")))?
    }

    async fn save(&self, table: PointerTable) -> LedgerResult<()> {
        let bytes = serde_json::to_vec_pretty(&table.into_records())
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        replace_file(&self.path, &bytes).await?;
        Ok(())
    }

    async fn record(
        &self,
        identity: &Identity,
        expected: Option<Option<ContentAddress>>,
        address: ContentAddress,
        credential: &Credential,
    ) -> CommitResult {
        if let Err(reason) = authorize(identity, &address, credential) {
            warn!(identity = %identity, %reason, "commit rejected");
            return CommitResult::Rejected(reason);
        }

        let _guard = self.io.lock().await;
        let _lock = match self.acquire_commit_lock().await {
            Ok(lock) => lock,
            Err(e) => {
                warn!(error = %e, path = %self.lock_path.display(), "ledger lock unavailable");
                return CommitResult::Rejected(RejectReason::LedgerUnavailable);
            }
        };
        let mut table = match self.load().await {
            Ok(table) => table,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "ledger file unreadable");
                return CommitResult::Rejected(RejectReason::LedgerUnavailable);
            }
        };
        let seq = match table.advance(identity, expected, address, self.mode) {
            Ok(seq) => seq,
            Err(reason) => {
                warn!(identity = %identity, %reason, "commit rejected");
                return CommitResult::Rejected(reason);
            }
        };
        if let Err(e) = self.save(table).await {
            warn!(error = %e, path = %self.path.display(), "ledger file not written");
            return CommitResult::Rejected(RejectReason::LedgerUnavailable);
        }
        debug!(identity = %identity, address = %address.short_hex(), seq, "pointer advanced");
        CommitResult::Accepted { seq }
    }
}

/// Write `bytes` to a sibling temp file and rename it over `path`.
///
/// The temp file is removed if either step fails.
async fn replace_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension(format!("tmp-{:016x}", rand::random::<u64>()));
    let written = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    written
}

#[async_trait]
impl PointerLedger for FilePointerLedger {
    async fn resolve(&self, identity: &Identity) -> LedgerResult<ContentAddress> {
        self.load()
            .await?
            .current(identity)
            .ok_or(LedgerError::UnknownIdentity(*identity))
    }

    async fn commit(
        &self,
        identity: &Identity,
        address: ContentAddress,
        credential: &Credential,
    ) -> CommitResult {
        self.record(identity, None, address, credential).await
    }

    async fn commit_expecting(
        &self,
        identity: &Identity,
        expected: Option<ContentAddress>,
        address: ContentAddress,
        credential: &Credential,
    ) -> CommitResult {
        self.record(identity, Some(expected), address, credential)
            .await
    }

    async fn history(&self, identity: &Identity) -> LedgerResult<Vec<PointerUpdate>> {
        Ok(self
            .load()
            .await?
            .trail(identity)
            .map(<[PointerUpdate]>::to_vec)
            .unwrap_or_default())
    }
}
