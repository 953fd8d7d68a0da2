use std::future::Future;

use tracing::{debug, info, warn};

use crate::cache::entry::CacheEntry;
use crate::cache::store::CacheStore;
use crate::types::context_bundle::{AssembledContent, SummaryResult};
use crate::types::identifiers::ContentFingerprint;

/// Result of a cache-wrapped computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached {
    pub result: SummaryResult,
    pub fingerprint: ContentFingerprint,
    pub hit: bool,
}

/// Memoizes the summarizer call keyed by the content fingerprint.
///
/// Two concurrent requests for the same fingerprint may both miss and both
/// compute. Entries are immutable and the overwrite is idempotent, so the
/// only cost is a duplicate upstream call; there is no per-key locking.
#[derive(Debug)]
pub struct FingerprintCache<S> {
    store: S,
}

impl<S> FingerprintCache<S>
where
    S: CacheStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// On a hit `compute` is never called. On a miss it is called exactly once
    /// and its result is stored before being returned.
    ///
    /// The store is an optimization: an unreadable entry counts as a miss and
    /// a failed write is logged, neither fails the call. Errors from
    /// `compute` propagate and nothing is stored.
    pub async fn get_or_compute<'a, F, Fut, E>(
        &self,
        content: &'a AssembledContent,
        compute: F,
    ) -> Result<Cached, E>
    where
        F: FnOnce(&'a AssembledContent) -> Fut,
        Fut: Future<Output = Result<SummaryResult, E>>,
    {
        let fingerprint = content.fingerprint();

        match self.store.get(&fingerprint).await {
            Ok(Some(entry)) => {
                info!(%fingerprint, "summary cache hit");
                return Ok(Cached {
                    result: entry.result,
                    fingerprint,
                    hit: true,
                });
            }
            Ok(None) => debug!(%fingerprint, "summary cache miss"),
            Err(e) => warn!(%fingerprint, error = %e, "unreadable cache entry, recomputing"),
        }

        let result = compute(content).await?;

        let entry = CacheEntry::new(fingerprint.clone(), result);
        if let Err(e) = self.store.put(&entry).await {
            warn!(%fingerprint, error = %e, "failed to persist summary");
        }

        Ok(Cached {
            result: entry.result,
            fingerprint,
            hit: false,
        })
    }
}
