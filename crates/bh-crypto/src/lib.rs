//! Cryptographic primitives for BlockHealth.
//!
//! Provides domain-separated BLAKE3 content hashing, Ed25519 signing and
//! verification, and the [`Credential`] a ledger checks before advancing a
//! patient's pointer.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod credential;
pub mod hasher;
pub mod signer;

pub use credential::{commit_statement, Credential};
pub use hasher::ContentHasher;
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
