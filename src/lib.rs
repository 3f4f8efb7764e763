//! Quizcache - offline-first synchronization of exam question pools.
//!
//! The engine keeps one local JSON file per question bank and decides, per
//! sync request, whether to serve the cached copy, refresh it from the
//! remote pool, or fall back to the cache when the network is unavailable.
//!
//! - [`Synchronizer`]: the per-bank fetch/compare/fallback policy
//! - [`CacheStore`]: durable per-device copies of the raw pool payloads
//! - [`HttpFetcher`] / [`QuestionSource`]: remote retrieval
//! - [`BankName`] / [`Question`]: the decoded data model

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod sync;

pub use cache::CacheStore;
pub use config::Config;
pub use error::SyncError;
pub use models::{parse_questions, BankName, Question};
pub use remote::{HttpFetcher, QuestionSource};
pub use sync::{SyncOutcome, SyncedBank, Synchronizer};
