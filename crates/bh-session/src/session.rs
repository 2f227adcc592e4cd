use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bh_crypto::Credential;
use bh_types::{ContentAddress, Identity};
use tracing::{debug, info};

use crate::error::SessionResult;
use crate::provider::IdentityProvider;

#[derive(Default)]
struct SessionState {
    connected: Option<Identity>,
    last_connected: Option<Identity>,
    pointers: HashMap<Identity, ContentAddress>,
}

/// The acting identity plus a process-local pointer cache.
///
/// Cache entries are hints. A write path must resolve through the ledger;
/// only reads configured to tolerate staleness consult them.
pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// The connected identity, asking the provider on first use.
    ///
    /// Connecting as a different identity than last time clears the cache.
    pub async fn connect(&self) -> SessionResult<Identity> {
        if let Some(identity) = self.read().connected {
            return Ok(identity);
        }
        let identity = self.provider.connect().await?;
        let mut state = self.write();
        if state.last_connected.is_some_and(|last| last != identity) {
            debug!(identity = %identity, "identity changed, cache cleared");
            state.pointers.clear();
        }
        state.connected = Some(identity);
        state.last_connected = Some(identity);
        info!(identity = %identity, "session connected");
        Ok(identity)
    }

    pub fn connected(&self) -> Option<Identity> {
        self.read().connected
    }

    pub fn cached_pointer(&self) -> Option<ContentAddress> {
        let state = self.read();
        state
            .connected
            .and_then(|id| state.pointers.get(&id).copied())
    }

    pub fn cached_pointer_for(&self, identity: &Identity) -> Option<ContentAddress> {
        self.read().pointers.get(identity).copied()
    }

    pub fn update_cache(&self, identity: &Identity, address: ContentAddress) {
        debug!(identity = %identity, address = %address.short_hex(), "cache updated");
        self.write().pointers.insert(*identity, address);
    }

    /// Drop every cached pointer. The connection is kept.
    pub fn refresh(&self) {
        self.write().pointers.clear();
    }

    pub fn disconnect(&self) {
        let mut state = self.write();
        if let Some(identity) = state.connected.take() {
            info!(identity = %identity, "session disconnected");
        }
        state.pointers.clear();
    }

    pub async fn credential_for(
        &self,
        identity: &Identity,
        address: &ContentAddress,
    ) -> SessionResult<Credential> {
        self.provider.sign_commit(identity, address).await
    }

    // The state holds plain values, so a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
