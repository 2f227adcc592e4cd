use bh_types::{ContentAddress, Identity};

use crate::signer::{Signature, SignatureError, SigningKey, VerifyingKey};

const COMMIT_DOMAIN: &[u8] = b"bh-commit-v1:";

/// The bytes an identity signs to authorize moving its pointer to `address`.
pub fn commit_statement(identity: &Identity, address: &ContentAddress) -> Vec<u8> {
    let mut msg = Vec::with_capacity(COMMIT_DOMAIN.len() + 64);
    msg.extend_from_slice(COMMIT_DOMAIN);
    msg.extend_from_slice(identity.as_bytes());
    msg.extend_from_slice(address.as_bytes());
    msg
}

/// Proof that the holder of `identity` approved one specific pointer commit.
///
/// A credential binds a public key and a signature over the commit statement.
/// It authorizes exactly one `(identity, address)` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub public_key: VerifyingKey,
    pub signature: Signature,
}

impl Credential {
    /// Sign a commit of `address` for the identity controlled by `key`.
    pub fn sign(key: &SigningKey, address: &ContentAddress) -> Self {
        let identity = key.identity();
        Self {
            public_key: key.verifying_key(),
            signature: key.sign(&commit_statement(&identity, address)),
        }
    }

    /// Check that this credential authorizes committing `address` for `identity`.
    pub fn verify(&self, identity: &Identity, address: &ContentAddress) -> Result<(), SignatureError> {
        if self.public_key.to_identity() != *identity {
            return Err(SignatureError::InvalidKey);
        }
        self.public_key
            .verify(&commit_statement(identity, address), &self.signature)
    }
}
