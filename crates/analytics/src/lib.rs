//! # Sentquant Analytics Engine
//!
//! This crate derives the raw performance factors of a single agent from its
//! NAV series. It knows nothing about other agents; cross-agent normalization
//! and ranking live in the `analyzer` crate.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O and no knowledge of external systems. It takes a
//!   chronological NAV series and produces a `FactorReport`.
//! - **No Division by Zero:** every ratio has a floor, so a well-formed but
//!   degenerate series (flat, single point, never losing) still yields numbers.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: The stateless calculator.
//! - `FactorReport`: ROI, Sortino, Calmar and stability for one agent.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{AnalyticsEngine, RATIO_FLOOR};
pub use error::AnalyticsError;
pub use report::FactorReport;
