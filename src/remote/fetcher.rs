//! HTTP retrieval of question pool payloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::SyncError;
use crate::models::BankName;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the published question pools.
const POOL_BASE_URL: &str = "https://pools.dlaporte.net/amateur";

/// HTTP request timeout in seconds.
/// 30s allows for slow cellular links while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fixed location for each bank's pool file.
fn pool_url(name: BankName) -> String {
    format!("{}/{}.json", POOL_BASE_URL, name.as_str())
}

/// Source of raw question pool bytes.
///
/// The production implementation is [`HttpFetcher`]; tests substitute an
/// in-memory source with programmed responses.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Retrieve the current payload for `name`.
    ///
    /// At most one attempt per call; retry policy belongs to the caller.
    async fn fetch(&self, name: BankName) -> Result<Vec<u8>, SyncError>;
}

/// Fetches question pools over HTTPS.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl QuestionSource for HttpFetcher {
    async fn fetch(&self, name: BankName) -> Result<Vec<u8>, SyncError> {
        let url = pool_url(name);
        debug!(bank = %name, url = %url, "fetching question pool");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        debug!(bank = %name, bytes = bytes.len(), "pool fetched");
        Ok(bytes.to_vec())
    }
}
