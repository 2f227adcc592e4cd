use bh_store::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Where `read` takes the current pointer from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadPolicy {
    /// Always resolve through the ledger.
    #[default]
    Authoritative,
    /// Use the session's cached pointer when there is one.
    TolerateStale,
}

/// Consistency knobs for a [`crate::RecordOrchestrator`].
///
/// The defaults give the plain protocol: ledger-authoritative reads,
/// last-writer-wins commits and no retries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Applies to `read` only. Writes always resolve through the ledger.
    pub read_policy: ReadPolicy,
    /// Commit with `commit_expecting(prior)` so a compare-and-swap ledger
    /// can reject a stale writer.
    pub expect_prior_pointer: bool,
    /// Retry `NotFound` while fetching, for stores with propagation delay.
    pub fetch_retry: Option<RetryPolicy>,
}
