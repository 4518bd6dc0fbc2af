//! # NAV Ledger
//!
//! Turns a stream of per-agent valuation observations into a date-ordered NAV
//! history with drawdown annotations.
//!
//! ## Architectural Principles
//!
//! - **Pure Calculation:** `NavLedger::ingest` is a function from
//!   `(history, observation)` to a new history. It performs no I/O; persisting
//!   the result atomically is the storage layer's job.
//! - **All or Nothing:** an ingest either returns the complete, recomputed
//!   history or an error. The caller's copy is never touched.
//!
//! ## Public API
//!
//! - `NavLedger`: applies the configured NAV policy to observations.
//! - `derive_nav`: the proportional growth step.
//! - `recompute_drawdowns`: the drawdown-from-peak pass over a whole history.
//! - `LedgerError`: the specific error types that can be returned from this crate.

pub mod error;
pub mod nav;

pub use error::LedgerError;
pub use nav::{NavLedger, derive_nav, recompute_drawdowns};
