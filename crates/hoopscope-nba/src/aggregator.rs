// Source-fallback aggregator.
//
// Walks the configured adapters in priority order and accepts the first batch
// that fetches, normalizes, and has records in scope. Batches are never mixed.
// The accepted batch is deduplicated, persisted with an atomic file replace,
// and published as the current snapshot.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use hoopscope_core::config::Config;
use hoopscope_core::{
    CanonicalRecord, DatasetSnapshot, Scope, Season, SnapshotError, SnapshotStore, SourceKind,
};

use crate::normalize::{normalize_batch, NormalizationError};
use crate::sources::{build_adapters, SourceAdapter, SourceError};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What happened when one adapter was tried.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Batch accepted; `records` after dedup.
    Accepted { records: usize },
    Unavailable(SourceError),
    Rejected(NormalizationError),
    /// Fetched and normalized fine, but nothing fell inside the scope.
    OutOfScope { fetched: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceAttempt {
    pub source: SourceKind,
    pub outcome: AttemptOutcome,
}

/// Result of a successful collection.
#[derive(Debug, Clone)]
pub struct CollectReport {
    pub snapshot: Arc<DatasetSnapshot>,
    /// Every adapter tried, in order, ending with the accepted one.
    pub attempts: Vec<SourceAttempt>,
    /// False when the on-disk write failed. The in-memory snapshot is still
    /// current.
    pub persisted: bool,
}

/// Every adapter failed. With a synthetic adapter in the chain this is a
/// defect, not an expected condition.
#[derive(Debug, Clone, Error)]
#[error("collection failed for {scope} {season}: all {} sources unavailable", attempts.len())]
pub struct CollectionFailed {
    pub scope: Scope,
    pub season: Season,
    pub attempts: Vec<SourceAttempt>,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

pub struct Aggregator {
    adapters: Vec<Box<dyn SourceAdapter>>,
    timeout: Duration,
    store: SnapshotStore,
    current: RwLock<Option<Arc<DatasetSnapshot>>>,
    /// Serializes the persist-then-publish step so disk and memory agree.
    publish: tokio::sync::Mutex<()>,
}

impl Aggregator {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>, timeout: Duration, store: SnapshotStore) -> Self {
        Self {
            adapters,
            timeout,
            store,
            current: RwLock::new(None),
            publish: tokio::sync::Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            build_adapters(&config.sources),
            config.sources.timeout(),
            SnapshotStore::new(config.snapshot_path()),
        )
    }

    pub fn sources(&self) -> Vec<SourceKind> {
        self.adapters.iter().map(|a| a.kind()).collect()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// The snapshot most recently published, if any.
    pub fn current(&self) -> Option<Arc<DatasetSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Restore the on-disk snapshot as current. `Ok(None)` when nothing has
    /// been persisted yet.
    pub fn load_persisted(&self) -> Result<Option<Arc<DatasetSnapshot>>, SnapshotError> {
        let Some(snapshot) = self.store.read()? else {
            return Ok(None);
        };
        let snapshot = Arc::new(snapshot);
        info!(
            path = %self.store.path().display(),
            records = snapshot.len(),
            source = %snapshot.source,
            "restored persisted snapshot"
        );
        self.swap(snapshot.clone());
        Ok(Some(snapshot))
    }

    /// Collect `scope` for `season`, falling back through the adapters.
    pub async fn collect(&self, scope: &Scope, season: &Season) -> Result<CollectReport, CollectionFailed> {
        let scope = &scope.normalized();
        let mut attempts = Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            let kind = adapter.kind();
            info!(source = %kind, %scope, %season, "trying source");

            let outcome = match self.try_adapter(adapter.as_ref(), scope, season).await {
                Ok(records) => {
                    let count = records.len();
                    attempts.push(SourceAttempt {
                        source: kind,
                        outcome: AttemptOutcome::Accepted { records: count },
                    });
                    info!(source = %kind, records = count, "source accepted");
                    let snapshot = Arc::new(DatasetSnapshot {
                        collected_at: Utc::now(),
                        source: kind,
                        scope: scope.clone(),
                        season: season.clone(),
                        records,
                    });
                    let persisted = self.publish(snapshot.clone()).await;
                    return Ok(CollectReport {
                        snapshot,
                        attempts,
                        persisted,
                    });
                }
                Err(outcome) => outcome,
            };

            warn!(source = %kind, outcome = ?outcome, "source failed, falling back");
            attempts.push(SourceAttempt {
                source: kind,
                outcome,
            });
        }

        let failed = CollectionFailed {
            scope: scope.clone(),
            season: season.clone(),
            attempts,
        };
        error!(error = %failed, attempts = ?failed.attempts, "no source produced data");
        Err(failed)
    }

    /// Fetch, normalize, scope-filter and dedup one adapter's batch. The
    /// error side is the attempt outcome to record.
    async fn try_adapter(
        &self,
        adapter: &dyn SourceAdapter,
        scope: &Scope,
        season: &Season,
    ) -> Result<Vec<CanonicalRecord>, AttemptOutcome> {
        let fetched = tokio::time::timeout(self.timeout, adapter.fetch(scope, season, self.timeout))
            .await
            .unwrap_or(Err(SourceError::TimedOut(self.timeout)))
            .map_err(AttemptOutcome::Unavailable)?;

        if fetched.is_empty() {
            return Err(AttemptOutcome::Unavailable(SourceError::Empty));
        }

        let normalized =
            normalize_batch(&fetched, adapter.kind(), season).map_err(AttemptOutcome::Rejected)?;
        if normalized.is_empty() {
            return Err(AttemptOutcome::Unavailable(SourceError::Empty));
        }
        let total = normalized.len();
        let in_scope: Vec<CanonicalRecord> =
            normalized.into_iter().filter(|r| scope.matches(r)).collect();
        if in_scope.is_empty() {
            return Err(AttemptOutcome::OutOfScope { fetched: total });
        }
        Ok(dedup(in_scope))
    }

    /// Persist, then publish. A failed write is logged and reported; the new
    /// snapshot still becomes current.
    async fn publish(&self, snapshot: Arc<DatasetSnapshot>) -> bool {
        let _guard = self.publish.lock().await;
        let persisted = match self.store.write(&snapshot) {
            Ok(()) => {
                info!(path = %self.store.path().display(), records = snapshot.len(), "snapshot persisted");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to persist snapshot, keeping it in memory only");
                false
            }
        };
        self.swap(snapshot);
        persisted
    }

    fn swap(&self, snapshot: Arc<DatasetSnapshot>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }
}

/// Deduplicate by record identity. A later duplicate replaces the earlier
/// one in the earlier one's position.
pub fn dedup(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut index = HashMap::with_capacity(records.len());
    let mut out: Vec<CanonicalRecord> = Vec::with_capacity(records.len());
    for record in records {
        match index.get(&record.key()) {
            Some(&pos) => out[pos] = record,
            None => {
                index.insert(record.key(), out.len());
                out.push(record);
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
