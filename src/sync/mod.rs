//! Synchronization of question banks against their remote pools.
//!
//! `Synchronizer` implements the fetch/compare/fallback policy; `compare`
//! holds the count-based freshness heuristic it relies on.

pub mod compare;
pub mod orchestrator;

pub use compare::{compare, Freshness};
pub use orchestrator::{SyncOutcome, SyncedBank, Synchronizer};
