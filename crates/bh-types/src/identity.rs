use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::{decode_32, hex_32};
use crate::error::TypeError;

/// Externally verifiable principal that owns a patient record.
///
/// An `Identity` is derived deterministically from an Ed25519 public key
/// using BLAKE3, so control of the identity is proven by signing with the
/// matching key. The same key always produces the same identity. The
/// all-zero identity is reserved as "no identity" and is never accepted by
/// a ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(#[serde(with = "hex_32")] [u8; 32]);

impl Identity {
    /// Derive an identity from a raw Ed25519 public key.
    pub fn derive(public_key: &[u8; 32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"bh-identity-v1:");
        hasher.update(public_key);
        Self(*hasher.finalize().as_bytes())
    }

    /// Create an ephemeral (random) identity for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self::derive(&bytes)
    }

    /// The null identity (all zeros).
    pub const fn null() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` if this is the null identity.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (`pt:` followed by 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("pt:{}", hex::encode(&self.0[..4]))
    }

    /// Parse from 64 hex characters, with or without the `pt:` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("pt:").unwrap_or(s);
        decode_32(s).map(Self)
    }

    /// Create from a raw 32-byte hash. Use `derive()` for production code.
    pub fn from_raw(hash: [u8; 32]) -> Self {
        Self(hash)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.short_id())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

impl std::str::FromStr for Identity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
