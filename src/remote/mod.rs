//! Remote retrieval of question pools.
//!
//! The `QuestionSource` trait is the seam between the synchronizer and the
//! network; `HttpFetcher` is the reqwest-backed production implementation.

pub mod fetcher;

pub use fetcher::{HttpFetcher, QuestionSource};
