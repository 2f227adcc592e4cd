//! Pointer bookkeeping shared by the ledger backends.

use std::collections::BTreeMap;

use bh_types::{ContentAddress, Identity};
use serde::{Deserialize, Serialize};

use crate::types::{CommitMode, PointerUpdate, RejectReason};

/// Identity to audit-trail map. The last update of a trail is the pointer.
#[derive(Clone, Debug, Default)]
pub(crate) struct PointerTable {
    trails: BTreeMap<Identity, Vec<PointerUpdate>>,
}

/// On-disk form of one identity's trail.
#[derive(Serialize, Deserialize)]
pub(crate) struct TrailRecord {
    pub identity: Identity,
    pub updates: Vec<PointerUpdate>,
}

impl PointerTable {
    pub fn current(&self, identity: &Identity) -> Option<ContentAddress> {
        self.trails
            .get(identity)
            .and_then(|t| t.last())
            .map(|u| u.address)
    }

    pub fn trail(&self, identity: &Identity) -> Option<&[PointerUpdate]> {
        self.trails.get(identity).map(Vec::as_slice)
    }

    /// Record a pointer move. `expected` is checked only in compare-and-swap mode.
    pub fn advance(
        &mut self,
        identity: &Identity,
        expected: Option<Option<ContentAddress>>,
        address: ContentAddress,
        mode: CommitMode,
    ) -> Result<u64, RejectReason> {
        let previous = self.current(identity);
        if let (CommitMode::CompareAndSwap, Some(expected)) = (mode, expected) {
            if previous != expected {
                return Err(RejectReason::Conflict { current: previous });
            }
        }

        let trail = self.trails.entry(*identity).or_default();
        let seq = trail.len() as u64 + 1;
        trail.push(PointerUpdate {
            seq,
            address,
            previous,
        });
        Ok(seq)
    }

    pub fn into_records(self) -> Vec<TrailRecord> {
        self.trails
            .into_iter()
            .map(|(identity, updates)| TrailRecord { identity, updates })
            .collect()
    }

    pub fn from_records(records: Vec<TrailRecord>) -> Self {
        Self {
            trails: records
                .into_iter()
                .map(|r| (r.identity, r.updates))
                .collect(),
        }
    }
}
