//! Foundation types for BlockHealth.
//!
//! Every other BlockHealth crate depends on `bh-types`.
//!
//! # Key Types
//!
//! - [`Identity`]: principal derived from an Ed25519 public key
//! - [`ContentAddress`]: BLAKE3 digest naming an immutable record
//! - [`PatientRecord`]: the document stored behind a patient's pointer
//! - [`HistoryEntry`] / [`HistoryEntryDraft`]: validated and raw medical history entries

pub mod address;
pub mod error;
pub mod identity;
pub mod record;

pub use address::ContentAddress;
pub use error::TypeError;
pub use identity::Identity;
pub use record::{
    HistoryEntry, HistoryEntryDraft, HistoryStatus, PatientProfile, PatientRecord,
    ValidationError, DATE_FORMAT,
};
