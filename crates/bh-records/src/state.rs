use std::fmt;

use serde::{Deserialize, Serialize};

/// Steps of one orchestrator invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateState {
    Idle,
    Connecting,
    Resolving,
    Fetching,
    Editing,
    Storing,
    Committing,
    Done,
    Failed,
}

impl UpdateState {
    /// `Done` and `Failed` end an invocation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Resolving => "Resolving",
            Self::Fetching => "Fetching",
            Self::Editing => "Editing",
            Self::Storing => "Storing",
            Self::Committing => "Committing",
            Self::Done => "Done",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}
