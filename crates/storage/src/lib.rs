//! # Sentquant Storage Crate
//!
//! This crate is the system's "permanent archive": one JSON file per agent in
//! the shape the dashboard reads, plus the artifacts derived from it.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** encapsulates every file-format detail and hides it from the
//!   ledger and ranking crates, which only see `AgentRecord`s and NAV series.
//! - **Replace on Success:** files are written to a temporary sibling and then
//!   renamed over the existing file, so a failed write leaves the previous history intact.
//! - **Snapshot Reads:** a history is read completely before it is parsed.
//!
//! ## Public API
//!
//! - `HistoryRepository`: load/save agent histories and export equity curves.
//! - `DisplayEntry` / `write_display_config`: the dashboard's ranking artifact.
//! - `StorageError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod display;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use display::{DisplayEntry, write_display_config};
pub use error::StorageError;
pub use repository::{EquityPoint, HistoryRepository};
