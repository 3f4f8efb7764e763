//! The synchronization policy: cache-first with remote comparison and
//! offline fallback.
//!
//! Per sync request the flow is:
//!
//! 1. No cached copy: fetch, validate, persist, serve (`UpdatedFromRemote`).
//! 2. Cached copy present: fetch and decode the remote pool, decode the
//!    cached one, compare counts. Equal counts serve the cache untouched
//!    (`UsedFreshCache`); differing counts overwrite the cache and serve the
//!    remote pool (`UpdatedFromRemote`).
//! 3. Any failure on the refresh path falls back to decoding the existing
//!    cache (`FellBackToCache`); only when that also fails does the call
//!    error out.
//!
//! Errors are never sticky: every call re-runs the sequence from the
//! cache-presence check. At most one sync per bank is in flight at a time;
//! distinct banks synchronize independently.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::SyncError;
use crate::models::{parse_questions, BankName, Question};
use crate::remote::QuestionSource;
use crate::sync::compare::{compare, Freshness};

/// Maximum banks synchronized concurrently by `sync_all`.
const MAX_CONCURRENT_SYNCS: usize = 3;

/// How a successful sync produced its question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Cached copy matched the remote pool and was served from disk.
    UsedFreshCache,
    /// The remote pool was fetched and now backs the cache.
    UpdatedFromRemote,
    /// Remote was unavailable or unusable; the existing cache was served.
    FellBackToCache,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncOutcome::UsedFreshCache => "up to date",
            SyncOutcome::UpdatedFromRemote => "updated from remote",
            SyncOutcome::FellBackToCache => "offline, using cached copy",
        };
        f.write_str(s)
    }
}

/// A synchronized question bank ready for presentation.
///
/// `questions` is the caller's own copy, already shuffled; reordering it
/// further never affects the cache.
#[derive(Debug, Clone)]
pub struct SyncedBank {
    pub name: BankName,
    pub outcome: SyncOutcome,
    pub questions: Vec<Question>,
}

pub struct Synchronizer<S> {
    source: S,
    cache: CacheStore,
    /// One guard per bank; overlapping syncs of the same bank serialize.
    in_flight: Mutex<HashMap<BankName, Arc<Mutex<()>>>>,
}

impl<S: QuestionSource> Synchronizer<S> {
    pub fn new(source: S, cache: CacheStore) -> Self {
        Self {
            source,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    async fn bank_guard(&self, name: BankName) -> Arc<Mutex<()>> {
        let mut guards = self.in_flight.lock().await;
        guards.entry(name).or_default().clone()
    }

    /// Synchronize one bank and return its shuffled question list.
    pub async fn sync(&self, name: BankName) -> Result<SyncedBank, SyncError> {
        let guard = self.bank_guard(name).await;
        let _in_flight = guard.lock().await;

        if !self.cache.exists(name) {
            return self.first_fetch(name).await;
        }

        match self.refresh(name).await {
            Ok(bank) => Ok(bank),
            Err(e) => {
                warn!(bank = %name, error = %e, "refresh failed, falling back to cache");
                self.fall_back(name)
            }
        }
    }

    /// Synchronize every known bank, a bounded number at a time.
    pub async fn sync_all(&self) -> Vec<(BankName, Result<SyncedBank, SyncError>)> {
        stream::iter(BankName::ALL)
            .map(|name| async move { (name, self.sync(name).await) })
            .buffer_unordered(MAX_CONCURRENT_SYNCS)
            .collect()
            .await
    }

    /// Decode the cached copy without consulting the remote source.
    pub fn cached(&self, name: BankName) -> Result<Vec<Question>, SyncError> {
        let mut questions = parse_questions(&self.cache.read(name)?)?;
        questions.shuffle(&mut rand::thread_rng());
        Ok(questions)
    }

    /// Cache age strings for status display.
    pub fn cache_ages(&self) -> Vec<(BankName, String)> {
        self.cache.ages()
    }

    /// No cached copy yet: the fetched pool must validate, there is nothing
    /// to fall back to.
    async fn first_fetch(&self, name: BankName) -> Result<SyncedBank, SyncError> {
        info!(bank = %name, "no cached copy, fetching");

        let bytes = self.source.fetch(name).await?;
        let questions = parse_questions(&bytes)?;

        if let Err(e) = self.cache.write(name, &bytes) {
            // Degraded to fetched-but-not-cached; the data is still usable
            warn!(bank = %name, error = %e, "fetched pool could not be cached");
        }

        Ok(ready(name, SyncOutcome::UpdatedFromRemote, questions))
    }

    /// Cached copy present: consult the remote pool and decide which copy to
    /// serve. Any error here routes the caller to `fall_back`.
    async fn refresh(&self, name: BankName) -> Result<SyncedBank, SyncError> {
        let remote_bytes = self.source.fetch(name).await?;
        let remote = parse_questions(&remote_bytes)?;
        let local = parse_questions(&self.cache.read(name)?)?;

        match compare(&local, &remote) {
            Freshness::Fresh => {
                debug!(bank = %name, count = local.len(), "cached pool matches remote");
                Ok(ready(name, SyncOutcome::UsedFreshCache, local))
            }
            Freshness::Stale => {
                info!(
                    bank = %name,
                    cached = local.len(),
                    remote = remote.len(),
                    "cached pool is stale, updating"
                );
                if let Err(e) = self.cache.write(name, &remote_bytes) {
                    warn!(bank = %name, error = %e, "updated pool could not be cached");
                }
                Ok(ready(name, SyncOutcome::UpdatedFromRemote, remote))
            }
        }
    }

    /// Serve the existing cache after a failed refresh. A cache that fails
    /// to decode here is the end of the line for this call.
    fn fall_back(&self, name: BankName) -> Result<SyncedBank, SyncError> {
        let questions = parse_questions(&self.cache.read(name)?)?;
        Ok(ready(name, SyncOutcome::FellBackToCache, questions))
    }
}

/// Shuffle the outgoing sequence once; cache bytes keep pool order.
fn ready(name: BankName, outcome: SyncOutcome, mut questions: Vec<Question>) -> SyncedBank {
    questions.shuffle(&mut rand::thread_rng());
    info!(bank = %name, %outcome, count = questions.len(), "sync complete");
    SyncedBank {
        name,
        outcome,
        questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::{tempdir, TempDir};

    const ONE_QUESTION: &str =
        r#"[{"id":"T1","question":"Q?","correct":1,"answers":["A","B","C"]}]"#;

    const TWO_QUESTIONS: &str = r#"[
        {"id":"T1","question":"Q?","correct":1,"answers":["A","B","C"]},
        {"id":"T2","question":"R?","correct":0,"answers":["A","B"]}
    ]"#;

    /// In-memory source with one programmed response per bank; unprogrammed
    /// banks fail like an unreachable host.
    struct MockSource {
        responses: HashMap<BankName, Vec<u8>>,
        calls: AtomicUsize,
    }

    impl MockSource {
        fn unreachable() -> Self {
            Self {
                responses: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn serving(name: BankName, payload: &str) -> Self {
            let mut responses = HashMap::new();
            responses.insert(name, payload.as_bytes().to_vec());
            Self {
                responses,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuestionSource for MockSource {
        async fn fetch(&self, name: BankName) -> Result<Vec<u8>, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(&name) {
                Some(bytes) => Ok(bytes.clone()),
                None => Err(SyncError::Transport("no route to host".to_string())),
            }
        }
    }

    fn synchronizer(source: MockSource) -> (Synchronizer<MockSource>, TempDir) {
        let dir = tempdir().unwrap();
        let cache = CacheStore::new(dir.path().to_path_buf()).unwrap();
        (Synchronizer::new(source, cache), dir)
    }

    fn sorted_ids(questions: &[Question]) -> Vec<&str> {
        let mut ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_first_sync_fetches_and_caches() {
        let (sync, dir) = synchronizer(MockSource::serving(BankName::Technician, ONE_QUESTION));

        let bank = sync.sync(BankName::Technician).await.unwrap();

        assert_eq!(bank.outcome, SyncOutcome::UpdatedFromRemote);
        assert_eq!(sorted_ids(&bank.questions), ["T1"]);
        assert_eq!(
            std::fs::read(dir.path().join("technician.json")).unwrap(),
            ONE_QUESTION.as_bytes()
        );
    }

    #[tokio::test]
    async fn test_equal_counts_serve_cache_unchanged() {
        // Cached pool and remote pool have the same count but different
        // content; the count heuristic keeps the cached copy.
        let cached = r#"[{"id":"OLD","question":"Q?","correct":0,"answers":["A","B"]}]"#;
        let (sync, dir) = synchronizer(MockSource::serving(BankName::General, ONE_QUESTION));
        sync.cache.write(BankName::General, cached.as_bytes()).unwrap();

        let bank = sync.sync(BankName::General).await.unwrap();

        assert_eq!(bank.outcome, SyncOutcome::UsedFreshCache);
        assert_eq!(sorted_ids(&bank.questions), ["OLD"]);
        assert_eq!(
            std::fs::read(dir.path().join("general.json")).unwrap(),
            cached.as_bytes()
        );
    }

    #[tokio::test]
    async fn test_differing_counts_overwrite_cache() {
        let (sync, dir) = synchronizer(MockSource::serving(BankName::Extra, TWO_QUESTIONS));
        sync.cache.write(BankName::Extra, ONE_QUESTION.as_bytes()).unwrap();

        let bank = sync.sync(BankName::Extra).await.unwrap();

        assert_eq!(bank.outcome, SyncOutcome::UpdatedFromRemote);
        assert_eq!(sorted_ids(&bank.questions), ["T1", "T2"]);
        assert_eq!(
            std::fs::read(dir.path().join("extra.json")).unwrap(),
            TWO_QUESTIONS.as_bytes()
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_cache() {
        let (sync, _dir) = synchronizer(MockSource::unreachable());
        sync.cache
            .write(BankName::Technician, TWO_QUESTIONS.as_bytes())
            .unwrap();

        let bank = sync.sync(BankName::Technician).await.unwrap();

        assert_eq!(bank.outcome, SyncOutcome::FellBackToCache);
        assert_eq!(sorted_ids(&bank.questions), ["T1", "T2"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_without_cache_fails() {
        let (sync, dir) = synchronizer(MockSource::unreachable());

        let err = sync.sync(BankName::Technician).await.unwrap_err();

        assert!(matches!(err, SyncError::Transport(_)));
        assert!(!dir.path().join("technician.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_remote_record_without_cache_fails() {
        let bad = r#"[{"id":"T9","question":"Q?","correct":5,"answers":["A","B","C"]}]"#;
        let (sync, dir) = synchronizer(MockSource::serving(BankName::General, bad));

        let err = sync.sync(BankName::General).await.unwrap_err();

        assert!(matches!(err, SyncError::InvalidRecord { id, .. } if id == "T9"));
        assert!(!dir.path().join("general.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_remote_payload_with_cache_falls_back() {
        let (sync, dir) = synchronizer(MockSource::serving(BankName::Extra, "not json"));
        sync.cache.write(BankName::Extra, ONE_QUESTION.as_bytes()).unwrap();

        let bank = sync.sync(BankName::Extra).await.unwrap();

        assert_eq!(bank.outcome, SyncOutcome::FellBackToCache);
        assert_eq!(sorted_ids(&bank.questions), ["T1"]);
        // The bad payload never reaches the cache
        assert_eq!(
            std::fs::read(dir.path().join("extra.json")).unwrap(),
            ONE_QUESTION.as_bytes()
        );
    }

    #[tokio::test]
    async fn test_corrupt_cache_with_dead_remote_fails() {
        let (sync, _dir) = synchronizer(MockSource::unreachable());
        sync.cache.write(BankName::General, b"not json").unwrap();

        let err = sync.sync(BankName::General).await.unwrap_err();

        assert!(matches!(err, SyncError::MalformedContent(_)));
    }

    #[tokio::test]
    async fn test_error_is_not_sticky() {
        // A failed call must not poison later calls for the same bank.
        let (sync, _dir) = synchronizer(MockSource::unreachable());

        assert!(sync.sync(BankName::Technician).await.is_err());

        sync.cache
            .write(BankName::Technician, ONE_QUESTION.as_bytes())
            .unwrap();
        let bank = sync.sync(BankName::Technician).await.unwrap();
        assert_eq!(bank.outcome, SyncOutcome::FellBackToCache);
    }

    #[tokio::test]
    async fn test_remote_consulted_even_when_cache_exists() {
        let (sync, _dir) = synchronizer(MockSource::serving(BankName::Technician, ONE_QUESTION));
        sync.cache
            .write(BankName::Technician, ONE_QUESTION.as_bytes())
            .unwrap();

        sync.sync(BankName::Technician).await.unwrap();

        assert_eq!(sync.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_shuffle_preserves_question_multiset() {
        let pool = r#"[
            {"id":"E1","question":"Q?","correct":0,"answers":["A","B"]},
            {"id":"E2","question":"Q?","correct":0,"answers":["A","B"]},
            {"id":"E3","question":"Q?","correct":0,"answers":["A","B"]},
            {"id":"E4","question":"Q?","correct":0,"answers":["A","B"]},
            {"id":"E5","question":"Q?","correct":0,"answers":["A","B"]}
        ]"#;
        let (sync, _dir) = synchronizer(MockSource::serving(BankName::Extra, pool));

        let bank = sync.sync(BankName::Extra).await.unwrap();

        assert_eq!(sorted_ids(&bank.questions), ["E1", "E2", "E3", "E4", "E5"]);
    }

    #[tokio::test]
    async fn test_cached_reads_without_network() {
        let (sync, _dir) = synchronizer(MockSource::unreachable());
        sync.cache
            .write(BankName::General, TWO_QUESTIONS.as_bytes())
            .unwrap();

        let questions = sync.cached(BankName::General).unwrap();

        assert_eq!(sorted_ids(&questions), ["T1", "T2"]);
        assert_eq!(sync.source.calls(), 0);
    }

    #[tokio::test]
    async fn test_cached_without_entry_is_not_found() {
        let (sync, _dir) = synchronizer(MockSource::unreachable());
        let err = sync.cached(BankName::Extra).unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sync_all_reports_every_bank() {
        let (sync, _dir) = synchronizer(MockSource::serving(BankName::Technician, ONE_QUESTION));

        let results = sync.sync_all().await;

        assert_eq!(results.len(), BankName::ALL.len());
        for (name, result) in results {
            match name {
                BankName::Technician => assert!(result.is_ok()),
                _ => assert!(matches!(result, Err(SyncError::Transport(_)))),
            }
        }
    }
}
