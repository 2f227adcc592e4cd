//! Session context for BlockHealth.
//!
//! A [`Session`] pairs an [`IdentityProvider`] (who is acting, and who signs
//! commits) with an advisory cache of the last pointer seen per identity.
//! The cache is never authoritative: the ledger is.

pub mod error;
pub mod provider;
pub mod session;

pub use error::{IdentityError, SessionResult};
pub use provider::{IdentityProvider, KeyringProvider};
pub use session::Session;
