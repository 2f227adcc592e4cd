use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bh_crypto::ContentHasher;
use bh_types::ContentAddress;

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// Call counters for an [`InMemoryContentStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub puts: u64,
    pub gets: u64,
}

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. Besides plain storage it can simulate
/// the two hazards of a remote content store: being unreachable
/// ([`Self::set_available`]) and propagation delay
/// ([`Self::with_propagation_lag`]).
pub struct InMemoryContentStore {
    state: Mutex<MemoryState>,
    available: AtomicBool,
    propagation_lag: u32,
    puts: AtomicU64,
    gets: AtomicU64,
}

#[derive(Default)]
struct MemoryState {
    blobs: HashMap<ContentAddress, Vec<u8>>,
    // Remaining misses before a freshly written address becomes visible.
    pending: HashMap<ContentAddress, u32>,
}

impl InMemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            available: AtomicBool::new(true),
            propagation_lag: 0,
            puts: AtomicU64::new(0),
            gets: AtomicU64::new(0),
        }
    }

    /// Make each newly written address miss its first `gets` lookups.
    pub fn with_propagation_lag(mut self, gets: u32) -> Self {
        self.propagation_lag = gets;
        self
    }

    /// Simulate the store going offline (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.blobs.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of every stored address.
    pub fn all_addresses(&self) -> Vec<ContentAddress> {
        let mut addrs: Vec<ContentAddress> = self
            .state
            .lock()
            .map(|s| s.blobs.keys().copied().collect())
            .unwrap_or_default();
        addrs.sort();
        addrs
    }

    /// Calls served so far, including failed ones.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            puts: self.puts.load(Ordering::SeqCst),
            gets: self.gets.load(Ordering::SeqCst),
        }
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store is offline".into()))
        }
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put_bytes(&self, bytes: Vec<u8>) -> StoreResult<ContentAddress> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let address = ContentHasher::RECORD.hash(&bytes);
        let mut state = self.lock()?;
        if !state.blobs.contains_key(&address) {
            state.blobs.insert(address, bytes);
            if self.propagation_lag > 0 {
                state.pending.insert(address, self.propagation_lag);
            }
        }
        Ok(address)
    }

    async fn get_bytes(&self, address: &ContentAddress) -> StoreResult<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut state = self.lock()?;
        if let Some(remaining) = state.pending.get_mut(address) {
            *remaining -= 1;
            if *remaining == 0 {
                state.pending.remove(address);
            }
            return Err(StoreError::NotFound(*address));
        }
        state
            .blobs
            .get(address)
            .cloned()
            .ok_or(StoreError::NotFound(*address))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("blob_count", &self.len())
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryContentStore::new();
        let addr = store.put_bytes(b"hello".to_vec()).await.unwrap();
        assert_eq!(store.get_bytes(&addr).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn same_bytes_are_deduplicated() {
        let store = InMemoryContentStore::new();
        let a1 = store.put_bytes(b"same".to_vec()).await.unwrap();
        let a2 = store.put_bytes(b"same".to_vec()).await.unwrap();
        assert_eq!(a1, a2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn different_bytes_different_addresses() {
        let store = InMemoryContentStore::new();
        let a1 = store.put_bytes(b"aaa".to_vec()).await.unwrap();
        let a2 = store.put_bytes(b"bbb".to_vec()).await.unwrap();
        assert_ne!(a1, a2);
        assert_eq!(store.all_addresses().len(), 2);
    }

    #[tokio::test]
    async fn offline_store_rejects_everything() {
        let store = InMemoryContentStore::new();
        let addr = store.put_bytes(b"x".to_vec()).await.unwrap();
        store.set_available(false);
        assert!(matches!(
            store.put_bytes(b"y".to_vec()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.get_bytes(&addr).await,
            Err(StoreError::Unavailable(_))
        ));
        store.set_available(true);
        assert!(store.get_bytes(&addr).await.is_ok());
        assert_eq!(store.stats(), StoreStats { puts: 2, gets: 2 });
    }

    #[tokio::test]
    async fn propagation_lag_misses_then_resolves() {
        let store = InMemoryContentStore::new().with_propagation_lag(2);
        let addr = store.put_bytes(b"lagging".to_vec()).await.unwrap();
        assert!(!store.contains(&addr).await.unwrap());
        assert!(!store.contains(&addr).await.unwrap());
        assert!(store.contains(&addr).await.unwrap());
    }

    #[tokio::test]
    async fn debug_format() {
        let store = InMemoryContentStore::new();
        store.put_bytes(b"x".to_vec()).await.unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryContentStore"));
        assert!(debug.contains("blob_count: 1"));
    }
}
