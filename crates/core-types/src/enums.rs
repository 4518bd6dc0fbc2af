use serde::{Deserialize, Serialize};

/// Liveness of an agent as reported by its venue.
///
/// The ledger never derives this itself; it persists whatever the valuation
/// source decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgentStatus {
    Live,
    #[default]
    Offline,
}

impl AgentStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, AgentStatus::Live)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Live => write!(f, "Live"),
            AgentStatus::Offline => write!(f, "Offline"),
        }
    }
}
