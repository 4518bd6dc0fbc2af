pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::AgentStatus;
pub use error::CoreError;
pub use structs::{
    AgentHistory, AgentRecord, NavPoint, Observation, recompute_drawdowns, valuation_from_f64,
};
