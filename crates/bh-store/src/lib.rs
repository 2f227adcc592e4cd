//! Content-addressed record storage for BlockHealth.
//!
//! Patient records are stored as immutable JSON blobs keyed by their BLAKE3
//! content address. The store is the off-chain half of the record protocol;
//! the pointer ledger (`bh-ledger`) decides which address is current.
//!
//! # Layers
//!
//! - [`ContentStore`] -- the byte-level service boundary (`put_bytes` / `get_bytes`)
//! - [`ContentStoreClient`] -- typed `put` / `get` of [`bh_types::PatientRecord`]
//!
//! # Backends
//!
//! - [`InMemoryContentStore`] -- `HashMap` store with fault injection for tests
//! - [`FsContentStore`] -- one file per address under a root directory
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written; the same bytes always map to the same address.
//! 2. `put` is idempotent and safe to retry.
//! 3. Unreferenced (orphaned) blobs are harmless and never garbage collected here.
//! 4. A client never trusts fetched bytes without re-hashing them.

pub mod client;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use client::{ContentStoreClient, RetryPolicy};
pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::{InMemoryContentStore, StoreStats};
pub use traits::ContentStore;
