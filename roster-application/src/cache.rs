//! In-memory mirror of one guild's roster.
//!
//! Readers clone an `Arc` of the current snapshot under a short read lock and
//! never see a half-applied refresh. Refreshes are coalesced behind
//! `refresh_gate`: a caller that queued behind a refresh which completed
//! while it waited receives that refresh's [`ChangeSet`] instead of issuing
//! its own fetch.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use roster_domain::{
    ChangeSet, GuildEventConfig, GuildId, RosterEntry, RosterSnapshot, StoreError,
};

use crate::{Metrics, RosterSheet};

pub struct RosterCache {
    guild: GuildId,
    snapshot: RwLock<Arc<RosterSnapshot>>,
    refresh_gate: Mutex<ChangeSet>,
    generation: AtomicU64,
    in_flight: AtomicBool,
    metrics: Arc<Metrics>,
}

impl RosterCache {
    pub fn new(guild: GuildId, metrics: Arc<Metrics>) -> Self {
        Self {
            guild,
            snapshot: RwLock::new(Arc::new(RosterSnapshot::default())),
            refresh_gate: Mutex::new(ChangeSet::default()),
            generation: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            metrics,
        }
    }

    pub fn snapshot(&self) -> Arc<RosterSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, identity: &str) -> Option<RosterEntry> {
        self.snapshot().get(identity).cloned()
    }

    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&RosterEntry) -> bool,
    {
        self.snapshot().count_where(predicate)
    }

    pub fn all(&self) -> Vec<RosterEntry> {
        self.snapshot()
            .in_row_order()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Number of completed refreshes since startup.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// True when the cache was never loaded or is older than `ttl`.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        let snapshot = self.snapshot();
        match snapshot.age(Utc::now()) {
            None => true,
            Some(age) => age.to_std().map(|age| age > ttl).unwrap_or(false),
        }
    }

    /// Reloads the whole roster from the sheet and swaps it in atomically.
    /// On failure the current snapshot is left untouched.
    pub async fn refresh(
        &self,
        sheet: &RosterSheet,
        config: &GuildEventConfig,
    ) -> Result<ChangeSet, StoreError> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut last_changes = self.refresh_gate.lock().await;
        if self.generation.load(Ordering::Acquire) != observed {
            debug!(guild = %self.guild, "joined a concurrent roster refresh");
            return Ok(last_changes.clone());
        }

        self.in_flight.store(true, Ordering::Release);
        let fetched = sheet.fetch_entries(config).await;
        self.in_flight.store(false, Ordering::Release);

        let entries = match fetched {
            Ok(entries) => entries,
            Err(err) => {
                self.metrics.record_refresh_error();
                warn!(guild = %self.guild, error = %err, "roster refresh failed, keeping previous snapshot");
                return Err(err);
            }
        };

        let next = Arc::new(RosterSnapshot::new(entries, Utc::now()));
        let changes = {
            let mut current = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            let changes = ChangeSet::diff(&current.entries, &next.entries);
            *current = next;
            changes
        };
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.metrics.record_refresh();
        info!(
            guild = %self.guild,
            added = changes.added.len(),
            removed = changes.removed.len(),
            updated = changes.updated.len(),
            "roster refreshed"
        );
        *last_changes = changes.clone();
        Ok(changes)
    }

    /// Mirrors a successful sheet write into the snapshot without a full
    /// refresh. Waits for any in-flight refresh so the patch is not lost to
    /// an older fetch.
    pub async fn apply(&self, entry: RosterEntry) {
        let _gate = self.refresh_gate.lock().await;
        let mut current = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let patched = current.with_entry(entry);
        *current = Arc::new(patched);
    }

    /// Applies several patches under one swap.
    pub async fn apply_all(&self, entries: Vec<RosterEntry>) {
        if entries.is_empty() {
            return;
        }
        let _gate = self.refresh_gate.lock().await;
        let mut current = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let mut patched = RosterSnapshot::clone(&current);
        for entry in entries {
            patched.entries.insert(entry.identity.clone(), entry);
        }
        *current = Arc::new(patched);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_invoker, FakeSheet};
    use roster_domain::{ColumnLayout, Identity};

    fn fixture() -> (Arc<FakeSheet>, RosterSheet, RosterCache) {
        let fake = Arc::new(FakeSheet::new());
        let metrics = Arc::new(Metrics::default());
        let sheet = RosterSheet::new(
            fake.clone(),
            test_invoker(),
            ColumnLayout::default(),
            metrics.clone(),
        );
        let cache = RosterCache::new(GuildId::new("g1"), metrics);
        (fake, sheet, cache)
    }

    #[tokio::test]
    async fn refresh_reports_changes_and_is_idempotent() {
        let (fake, sheet, cache) = fixture();
        let layout = ColumnLayout::default();
        let config = GuildEventConfig::default();
        fake.seed_row(&layout, 3, "a", true, false, None);
        fake.seed_row(&layout, 4, "b", true, true, None);

        let first = cache.refresh(&sheet, &config).await.expect("first refresh");
        assert_eq!(first.added.len(), 2);
        let before = cache.snapshot();

        let second = cache.refresh(&sheet, &config).await.expect("second refresh");
        assert!(second.is_empty());
        assert_eq!(cache.snapshot().entries, before.entries);
        assert_eq!(cache.generation(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_snapshot() {
        let (fake, sheet, cache) = fixture();
        let config = GuildEventConfig::default();
        fake.seed_row(&ColumnLayout::default(), 3, "a", true, false, None);
        cache.refresh(&sheet, &config).await.expect("initial refresh");

        fake.fail_next_read(StoreError::Rejected("permission denied".to_string()));
        let err = cache.refresh(&sheet, &config).await.expect_err("refresh fails");
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(cache.snapshot().is_registered("a"));
        assert!(!cache.refresh_in_flight());
    }

    #[tokio::test]
    async fn apply_patches_without_touching_other_entries() {
        let (fake, sheet, cache) = fixture();
        let config = GuildEventConfig::default();
        fake.seed_row(&ColumnLayout::default(), 3, "a", true, false, None);
        cache.refresh(&sheet, &config).await.expect("refresh");
        let before = cache.snapshot();

        let mut entry = cache.get("a").expect("entry a");
        entry.checked_in = true;
        cache.apply(entry).await;

        assert!(!before.get("a").map(|e| e.checked_in).unwrap_or(true));
        assert!(cache.get("a").map(|e| e.checked_in).unwrap_or(false));
        assert_eq!(cache.snapshot().last_refreshed_at, before.last_refreshed_at);
    }

    #[tokio::test]
    async fn concurrent_refreshes_are_coalesced() {
        let (fake, sheet, cache) = fixture();
        let config = GuildEventConfig::default();
        fake.seed_row(&ColumnLayout::default(), 3, "a", true, false, None);
        let gate = fake.pause_reads();

        let (first, second) = tokio::join!(cache.refresh(&sheet, &config), async {
            gate.started.notified().await;
            gate.release.notify_one();
            cache.refresh(&sheet, &config).await
        });

        let first = first.expect("first refresh");
        let second = second.expect("second refresh");
        assert_eq!(first, second);
        assert_eq!(cache.generation(), 1);
        assert!(cache.get(Identity::new("a").as_str()).is_some());
    }

    #[test]
    fn unloaded_cache_is_stale() {
        let cache = RosterCache::new(GuildId::new("g1"), Arc::new(Metrics::default()));
        assert!(cache.is_stale(Duration::from_secs(3600)));
    }
}
