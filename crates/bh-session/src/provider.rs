use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bh_crypto::{Credential, SigningKey};
use bh_types::{ContentAddress, Identity};
use tracing::debug;

use crate::error::{IdentityError, SessionResult};

/// Supplies the acting identity and signs commit statements for it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn connect(&self) -> SessionResult<Identity>;
    async fn sign_commit(
        &self,
        identity: &Identity,
        address: &ContentAddress,
    ) -> SessionResult<Credential>;
}

/// Local Ed25519 keys. The first key is the ambient identity.
pub struct KeyringProvider {
    keys: Vec<SigningKey>,
    declining: AtomicBool,
}

impl KeyringProvider {
    pub fn new(keys: Vec<SigningKey>) -> Self {
        Self {
            keys,
            declining: AtomicBool::new(false),
        }
    }

    pub fn single(key: SigningKey) -> Self {
        Self::new(vec![key])
    }

    /// A provider that refuses every request, as a user dismissing a prompt would.
    pub fn declining(self) -> Self {
        self.set_declining(true);
        self
    }

    pub fn set_declining(&self, declining: bool) {
        self.declining.store(declining, Ordering::SeqCst);
    }

    pub fn identities(&self) -> Vec<Identity> {
        self.keys.iter().map(SigningKey::identity).collect()
    }

    fn check_consent(&self) -> SessionResult<()> {
        if self.declining.load(Ordering::SeqCst) {
            return Err(IdentityError::UserDeclined);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for KeyringProvider {
    async fn connect(&self) -> SessionResult<Identity> {
        self.check_consent()?;
        self.keys
            .first()
            .map(SigningKey::identity)
            .ok_or(IdentityError::NoIdentityAvailable)
    }

    async fn sign_commit(
        &self,
        identity: &Identity,
        address: &ContentAddress,
    ) -> SessionResult<Credential> {
        self.check_consent()?;
        let key = self
            .keys
            .iter()
            .find(|k| k.identity() == *identity)
            .ok_or(IdentityError::NotControlled(*identity))?;
        debug!(identity = %identity, address = %address.short_hex(), "commit signed");
        Ok(Credential::sign(key, address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_returns_first_key() {
        let a = SigningKey::generate();
        let b = SigningKey::generate();
        let expected = a.identity();
        let provider = KeyringProvider::new(vec![a, b]);
        assert_eq!(provider.connect().await.unwrap(), expected);
        assert_eq!(provider.identities().len(), 2);
    }

    #[tokio::test]
    async fn empty_keyring_has_no_identity() {
        let provider = KeyringProvider::new(Vec::new());
        assert_eq!(provider.connect().await, Err(IdentityError::NoIdentityAvailable));
    }

    #[tokio::test]
    async fn declining_provider_refuses() {
        let key = SigningKey::generate();
        let id = key.identity();
        let provider = KeyringProvider::single(key).declining();
        assert_eq!(provider.connect().await, Err(IdentityError::UserDeclined));
        let addr = ContentAddress::from_hash([1; 32]);
        assert_eq!(
            provider.sign_commit(&id, &addr).await.unwrap_err(),
            IdentityError::UserDeclined
        );

        provider.set_declining(false);
        assert_eq!(provider.connect().await.unwrap(), id);
    }

    #[tokio::test]
    async fn signs_only_for_controlled_identities() {
        let key = SigningKey::generate();
        let id = key.identity();
        let provider = KeyringProvider::single(key);
        let addr = ContentAddress::from_hash([7; 32]);

        let credential = provider.sign_commit(&id, &addr).await.unwrap();
        assert!(credential.verify(&id, &addr).is_ok());

        let stranger = Identity::ephemeral();
        assert_eq!(
            provider.sign_commit(&stranger, &addr).await.unwrap_err(),
            IdentityError::NotControlled(stranger)
        );
    }
}
