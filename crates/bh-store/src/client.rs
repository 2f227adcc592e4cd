use std::sync::Arc;
use std::time::Duration;

use bh_crypto::ContentHasher;
use bh_types::{ContentAddress, PatientRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// Backoff schedule for [`ContentStoreClient::get_with_retry`].
///
/// Only `NotFound` is retried; every other error is returned immediately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for a single delay, in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

/// Typed client over a [`ContentStore`].
///
/// Encodes records as JSON on the way in, and re-hashes and decodes them on
/// the way out.
#[derive(Clone)]
pub struct ContentStoreClient {
    store: Arc<dyn ContentStore>,
}

impl ContentStoreClient {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Serialize a record to the exact bytes that will be stored.
    pub fn encode(record: &PatientRecord) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(record).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// The address a record will be stored under, without storing it.
    pub fn address_of(record: &PatientRecord) -> StoreResult<ContentAddress> {
        Ok(ContentHasher::RECORD.hash(&Self::encode(record)?))
    }

    /// Store a record and return its content address.
    pub async fn put(&self, record: &PatientRecord) -> StoreResult<ContentAddress> {
        let bytes = Self::encode(record)?;
        let expected = ContentHasher::RECORD.hash(&bytes);
        let address = self.store.put_bytes(bytes).await?;
        if address != expected {
            return Err(StoreError::HashMismatch {
                expected,
                computed: address,
            });
        }
        debug!(address = %address.short_hex(), "record stored");
        Ok(address)
    }

    /// Fetch and decode the record stored under `address`.
    pub async fn get(&self, address: &ContentAddress) -> StoreResult<PatientRecord> {
        let bytes = self.store.get_bytes(address).await?;
        let computed = ContentHasher::RECORD.hash(&bytes);
        if computed != *address {
            return Err(StoreError::HashMismatch {
                expected: *address,
                computed,
            });
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Like [`Self::get`], retrying `NotFound` with exponential backoff.
    pub async fn get_with_retry(
        &self,
        address: &ContentAddress,
        policy: &RetryPolicy,
    ) -> StoreResult<PatientRecord> {
        let attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.get(address).await {
                Err(e) if e.is_not_found() && attempt < attempts => {
                    let delay = policy.backoff(attempt);
                    debug!(
                        address = %address.short_hex(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "record not yet visible; backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }
}

impl std::fmt::Debug for ContentStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStoreClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryContentStore;
    use bh_types::{HistoryEntry, HistoryStatus, PatientProfile};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn record(name: &str) -> PatientRecord {
        PatientRecord::new(PatientProfile::new(name)).with_entry(HistoryEntry::new(
            "flu",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            HistoryStatus::Treated,
        ))
    }

    fn client() -> (Arc<InMemoryContentStore>, ContentStoreClient) {
        let store = Arc::new(InMemoryContentStore::new());
        (store.clone(), ContentStoreClient::new(store))
    }

    #[tokio::test]
    async fn put_then_get() {
        let (_, client) = client();
        let rec = record("Ada");
        let addr = client.put(&rec).await.unwrap();
        assert_eq!(client.get(&addr).await.unwrap(), rec);
    }

    #[tokio::test]
    async fn put_twice_same_address() {
        let (store, client) = client();
        let a1 = client.put(&record("Ada")).await.unwrap();
        let a2 = client.put(&record("Ada")).await.unwrap();
        assert_eq!(a1, a2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn address_of_matches_put() {
        let (_, client) = client();
        let rec = record("Grace");
        let predicted = ContentStoreClient::address_of(&rec).unwrap();
        assert_eq!(client.put(&rec).await.unwrap(), predicted);
    }

    #[tokio::test]
    async fn get_is_stable() {
        let (store, client) = client();
        let addr = client.put(&record("Ada")).await.unwrap();
        let first = store.get_bytes(&addr).await.unwrap();
        client.put(&record("Someone else")).await.unwrap();
        for _ in 0..3 {
            assert_eq!(store.get_bytes(&addr).await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn undecodable_bytes() {
        let (store, client) = client();
        let addr = store.put_bytes(b"not json".to_vec()).await.unwrap();
        let err = client.get(&addr).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn unknown_address_not_found() {
        let (_, client) = client();
        let err = client
            .get(&ContentAddress::from_hash([9; 32]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unavailable_store_fails_put() {
        let (store, client) = client();
        store.set_available(false);
        let err = client.put(&record("Ada")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_rides_out_propagation_lag() {
        let store = Arc::new(InMemoryContentStore::new().with_propagation_lag(2));
        let client = ContentStoreClient::new(store.clone());
        let rec = record("Ada");
        let addr = client.put(&rec).await.unwrap();

        let fetched = client
            .get_with_retry(&addr, &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(fetched, rec);
        assert_eq!(store.stats().gets, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_after_max_attempts() {
        let store = Arc::new(InMemoryContentStore::new().with_propagation_lag(10));
        let client = ContentStoreClient::new(store.clone());
        let addr = client.put(&record("Ada")).await.unwrap();

        let policy = RetryPolicy {
            max_attempts: 3,
            ..Default::default()
        };
        let err = client.get_with_retry(&addr, &policy).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.stats().gets, 3);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(10), Duration::from_millis(2_000));
    }

    proptest! {
        #[test]
        fn same_record_same_address(name in "[A-Za-z ]{1,24}", disease in "[a-z]{1,12}") {
            let rec = PatientRecord::new(PatientProfile::new(name)).with_entry(HistoryEntry::new(
                disease,
                NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
                HistoryStatus::Ongoing,
            ));
            let a = ContentStoreClient::address_of(&rec).unwrap();
            let b = ContentStoreClient::address_of(&rec.clone()).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
