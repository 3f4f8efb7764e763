//! Local caching module for offline pool access.
//!
//! This module provides the `CacheStore` for persisting each bank's raw
//! payload to the per-device data area. Cache files use the same JSON
//! format as the remote pools, so a cached bank decodes identically to a
//! freshly fetched one.

pub mod store;

pub use store::CacheStore;
