//! Record update orchestrator for BlockHealth.
//!
//! [`RecordOrchestrator`] composes the content store, the pointer ledger and
//! the session into the read-modify-write cycle for one patient record:
//!
//! ```text
//! Idle -> Connecting -> Resolving -> Fetching -> Editing -> Storing -> Committing -> Done
//! ```
//!
//! Any step may fail; the resulting [`UpdateError`] names the state it
//! failed in. Invocations are independent and never retried internally.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use config::{OrchestratorConfig, ReadPolicy};
pub use error::{FailureReason, UpdateError, UpdateResult};
pub use orchestrator::RecordOrchestrator;
pub use state::UpdateState;
