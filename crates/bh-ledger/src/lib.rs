//! Pointer ledger for BlockHealth.
//!
//! The ledger holds one mutable pointer per patient identity: the content
//! address of that patient's current record. It is the single source of
//! truth for *which* record is current; the records themselves live in the
//! content store (`bh-store`).
//!
//! # Commit semantics
//!
//! [`PointerLedger::commit`] is "authorize and record": any commit carrying a
//! valid [`bh_crypto::Credential`] for the identity is accepted, regardless
//! of what the pointer was when the caller read it. Two writers racing on one
//! identity can therefore both be accepted, and the later commit wins.
//! [`PointerLedger::commit_expecting`] is the compare-and-swap extension
//! point; backends opt in through [`CommitMode::CompareAndSwap`].
//!
//! # Modules
//!
//! - [`error`]: [`LedgerError`] for reads and I/O
//! - [`types`]: [`CommitResult`], [`RejectReason`], [`PointerUpdate`], [`CommitMode`]
//! - [`traits`]: the [`PointerLedger`] trait
//! - [`memory`]: [`InMemoryPointerLedger`] for tests
//! - [`file`]: [`FilePointerLedger`], a JSON file for local use

pub mod error;
pub mod file;
pub mod memory;
mod table;
pub mod traits;
pub mod types;

pub use error::{LedgerError, LedgerResult};
pub use file::FilePointerLedger;
pub use memory::{InMemoryPointerLedger, LedgerStats};
pub use traits::{authorize, PointerLedger};
pub use types::{CommitMode, CommitResult, PointerUpdate, RejectReason};
