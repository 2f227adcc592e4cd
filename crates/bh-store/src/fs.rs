use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bh_crypto::ContentHasher;
use bh_types::ContentAddress;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// Filesystem content store.
///
/// Blobs live at `<root>/objects/<first 2 hex>/<remaining 62 hex>`, the same
/// fan-out git uses. Writes go to a temporary sibling file and are renamed
/// into place, so a reader never observes a half-written blob.
#[derive(Clone, Debug)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join("objects")).await?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, address: &ContentAddress) -> PathBuf {
        let hex = address.to_hex();
        let (dir, file) = hex.split_at(2);
        self.root.join("objects").join(dir).join(file)
    }
}

/// Write `bytes` to a temp file in `dir` and rename it to `path`.
///
/// On failure the temp file is removed before the error is returned.
async fn place_blob(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = dir.join(format!(".tmp-{:016x}", rand::random::<u64>()));
    let placed = match tokio::fs::write(&tmp, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if placed.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    placed
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn put_bytes(&self, bytes: Vec<u8>) -> StoreResult<ContentAddress> {
        let address = ContentHasher::RECORD.hash(&bytes);
        let path = self.object_path(&address);
        if tokio::fs::try_exists(&path).await? {
            return Ok(address);
        }

        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Unavailable("object path has no parent".into()))?;
        tokio::fs::create_dir_all(dir).await?;

        place_blob(dir, &path, &bytes).await?;
        debug!(address = %address.short_hex(), bytes = bytes.len(), "blob written");
        Ok(address)
    }

    async fn get_bytes(&self, address: &ContentAddress) -> StoreResult<Vec<u8>> {
        match tokio::fs::read(self.object_path(address)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(*address)),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
