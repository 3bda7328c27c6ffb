//! Per-guild roster state: the event config, the cached snapshot, the sheet
//! gateway and the lock that serializes promotion passes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::warn;

use roster_domain::{ChangeSet, GuildEventConfig, GuildId, RosterResult, RosterSnapshot};

use crate::{Metrics, RosterCache, RosterSheet};

/// Everything the service holds for one guild's event.
pub struct GuildRoster {
    pub id: GuildId,
    event: RwLock<GuildEventConfig>,
    pub cache: RosterCache,
    pub sheet: RosterSheet,
    promotion_lock: Mutex<()>,
}

impl GuildRoster {
    pub fn new(id: GuildId, event: GuildEventConfig, sheet: RosterSheet, metrics: Arc<Metrics>) -> Self {
        Self {
            cache: RosterCache::new(id.clone(), metrics),
            id,
            event: RwLock::new(event),
            sheet,
            promotion_lock: Mutex::new(()),
        }
    }

    pub async fn event_config(&self) -> GuildEventConfig {
        self.event.read().await.clone()
    }

    pub async fn set_event_config(&self, config: GuildEventConfig) {
        *self.event.write().await = config;
    }

    pub async fn refresh(&self) -> RosterResult<ChangeSet> {
        let config = self.event_config().await;
        Ok(self.cache.refresh(&self.sheet, &config).await?)
    }

    /// Returns a snapshot no older than `ttl`. A failed refresh falls back to
    /// the previous snapshot when one exists.
    pub async fn ensure_fresh(&self, ttl: Duration) -> RosterResult<Arc<RosterSnapshot>> {
        if self.cache.is_stale(ttl) {
            if let Err(err) = self.refresh().await {
                if self.cache.snapshot().last_refreshed_at.is_none() {
                    return Err(err);
                }
                warn!(guild = %self.id, error = %err, "serving stale roster after failed refresh");
            }
        }
        Ok(self.cache.snapshot())
    }

    pub(crate) async fn lock_promotions(&self) -> MutexGuard<'_, ()> {
        self.promotion_lock.lock().await
    }
}
