//! Durable FIFO waitlist, one queue per guild.
//!
//! Every mutation is staged on a copy, persisted with `save_all`, and only
//! then committed to memory. A failed save leaves both the file and the
//! in-memory queue unchanged and surfaces as [`RosterError::Persistence`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info};

use roster_domain::{
    GuildId, Identity, RosterError, RosterResult, WaitlistEntry, WaitlistRepository,
    WaitlistUpdate,
};

pub struct WaitlistStore {
    repository: Arc<dyn WaitlistRepository>,
    queues: Mutex<HashMap<GuildId, Vec<WaitlistEntry>>>,
}

type Queues<'a> = MutexGuard<'a, HashMap<GuildId, Vec<WaitlistEntry>>>;

impl WaitlistStore {
    pub fn new(repository: Arc<dyn WaitlistRepository>) -> Self {
        Self {
            repository,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Appends at the tail and returns the 1-based position. An identity
    /// already queued keeps its place.
    pub async fn append(&self, guild: &GuildId, entry: WaitlistEntry) -> RosterResult<usize> {
        let mut queues = self.lock_loaded(guild).await?;
        let current = queue_of(&queues, guild);
        if let Some(index) = index_of(current, &entry.identity) {
            return Ok(index + 1);
        }
        let mut staged = current.to_vec();
        let identity = entry.identity.clone();
        staged.push(entry);
        let position = staged.len();
        self.commit(&mut queues, guild, staged).await?;
        info!(guild = %guild, identity = %identity, position, "added to waitlist");
        Ok(position)
    }

    pub async fn remove(&self, guild: &GuildId, identity: &Identity) -> RosterResult<bool> {
        Ok(self.take(guild, identity).await?.is_some())
    }

    /// Removes and returns the entry for `identity`, if queued.
    pub async fn take(
        &self,
        guild: &GuildId,
        identity: &Identity,
    ) -> RosterResult<Option<WaitlistEntry>> {
        let mut queues = self.lock_loaded(guild).await?;
        let current = queue_of(&queues, guild);
        let Some(index) = index_of(current, identity) else {
            return Ok(None);
        };
        let mut staged = current.to_vec();
        let removed = staged.remove(index);
        self.commit(&mut queues, guild, staged).await?;
        Ok(Some(removed))
    }

    /// Puts an entry back at the head of the queue after a failed promotion.
    pub async fn reinsert_front(&self, guild: &GuildId, entry: WaitlistEntry) -> RosterResult<()> {
        let mut queues = self.lock_loaded(guild).await?;
        let current = queue_of(&queues, guild);
        if index_of(current, &entry.identity).is_some() {
            return Ok(());
        }
        let mut staged = Vec::with_capacity(current.len() + 1);
        staged.push(entry);
        staged.extend_from_slice(current);
        self.commit(&mut queues, guild, staged).await
    }

    pub async fn position_of(
        &self,
        guild: &GuildId,
        identity: &Identity,
    ) -> RosterResult<Option<usize>> {
        let queues = self.lock_loaded(guild).await?;
        Ok(index_of(queue_of(&queues, guild), identity).map(|index| index + 1))
    }

    pub async fn get(
        &self,
        guild: &GuildId,
        identity: &Identity,
    ) -> RosterResult<Option<WaitlistEntry>> {
        let queues = self.lock_loaded(guild).await?;
        let queue = queue_of(&queues, guild);
        Ok(index_of(queue, identity).map(|index| queue[index].clone()))
    }

    /// Edits a queued entry in place. Position and `added_at` are kept.
    pub async fn update(
        &self,
        guild: &GuildId,
        identity: &Identity,
        update: WaitlistUpdate,
    ) -> RosterResult<Option<usize>> {
        let mut queues = self.lock_loaded(guild).await?;
        let current = queue_of(&queues, guild);
        let Some(index) = index_of(current, identity) else {
            return Ok(None);
        };
        let mut staged = current.to_vec();
        staged[index].apply(update, Utc::now());
        self.commit(&mut queues, guild, staged).await?;
        Ok(Some(index + 1))
    }

    pub async fn list_in_order(&self, guild: &GuildId) -> RosterResult<Vec<WaitlistEntry>> {
        let queues = self.lock_loaded(guild).await?;
        Ok(queue_of(&queues, guild).to_vec())
    }

    pub async fn len(&self, guild: &GuildId) -> RosterResult<usize> {
        let queues = self.lock_loaded(guild).await?;
        Ok(queue_of(&queues, guild).len())
    }

    /// Empties the queue and returns how many entries were dropped.
    pub async fn clear(&self, guild: &GuildId) -> RosterResult<usize> {
        let mut queues = self.lock_loaded(guild).await?;
        let count = queue_of(&queues, guild).len();
        if count == 0 {
            return Ok(0);
        }
        self.commit(&mut queues, guild, Vec::new()).await?;
        info!(guild = %guild, count, "waitlist cleared");
        Ok(count)
    }

    async fn lock_loaded(&self, guild: &GuildId) -> RosterResult<Queues<'_>> {
        let mut queues = self.queues.lock().await;
        if !queues.contains_key(guild) {
            let loaded = self
                .repository
                .load_all(guild)
                .await
                .map_err(RosterError::persistence)?;
            queues.insert(guild.clone(), loaded);
        }
        Ok(queues)
    }

    async fn commit(
        &self,
        queues: &mut Queues<'_>,
        guild: &GuildId,
        staged: Vec<WaitlistEntry>,
    ) -> RosterResult<()> {
        if let Err(err) = self.repository.save_all(guild, &staged).await {
            error!(guild = %guild, error = %err, "failed to persist waitlist");
            return Err(RosterError::persistence(err));
        }
        queues.insert(guild.clone(), staged);
        Ok(())
    }
}

fn queue_of<'a>(queues: &'a HashMap<GuildId, Vec<WaitlistEntry>>, guild: &GuildId) -> &'a [WaitlistEntry] {
    queues.get(guild).map(Vec::as_slice).unwrap_or(&[])
}

fn index_of(queue: &[WaitlistEntry], identity: &Identity) -> Option<usize> {
    queue.iter().position(|entry| entry.identity == *identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{waitlist_entry, MemoryWaitlistRepository};
    use roster_domain::RegistrationProfile;

    fn store() -> (Arc<MemoryWaitlistRepository>, WaitlistStore) {
        let repo = Arc::new(MemoryWaitlistRepository::default());
        (repo.clone(), WaitlistStore::new(repo))
    }

    #[tokio::test]
    async fn append_is_fifo_and_deduplicated() {
        let (_, store) = store();
        let guild = GuildId::new("g1");
        assert_eq!(store.append(&guild, waitlist_entry("a", None)).await.expect("append a"), 1);
        assert_eq!(store.append(&guild, waitlist_entry("b", None)).await.expect("append b"), 2);
        assert_eq!(store.append(&guild, waitlist_entry("a", None)).await.expect("append a again"), 1);
        assert_eq!(store.len(&guild).await.expect("len"), 2);
        assert_eq!(
            store.position_of(&guild, &Identity::new("b")).await.expect("position"),
            Some(2)
        );
    }

    #[tokio::test]
    async fn failed_save_leaves_queue_unchanged() {
        let (repo, store) = store();
        let guild = GuildId::new("g1");
        store.append(&guild, waitlist_entry("a", None)).await.expect("append a");

        repo.fail_next_save();
        let err = store
            .append(&guild, waitlist_entry("b", None))
            .await
            .expect_err("save fails");
        assert!(matches!(err, RosterError::Persistence(_)));
        assert_eq!(store.len(&guild).await.expect("len"), 1);
        assert_eq!(repo.stored(&guild).len(), 1);
    }

    #[tokio::test]
    async fn update_keeps_position_and_added_at() {
        let (_, store) = store();
        let guild = GuildId::new("g1");
        store.append(&guild, waitlist_entry("a", None)).await.expect("append a");
        store.append(&guild, waitlist_entry("b", None)).await.expect("append b");
        let before = store
            .get(&guild, &Identity::new("a"))
            .await
            .expect("get")
            .expect("entry a");

        let position = store
            .update(
                &guild,
                &Identity::new("a"),
                WaitlistUpdate {
                    profile: RegistrationProfile {
                        display_name: "Renamed".to_string(),
                        ..RegistrationProfile::default()
                    },
                    team: Some("Blue".to_string()),
                },
            )
            .await
            .expect("update");
        assert_eq!(position, Some(1));
        let after = store
            .get(&guild, &Identity::new("a"))
            .await
            .expect("get")
            .expect("entry a");
        assert_eq!(after.added_at, before.added_at);
        assert_eq!(after.display_name, "Renamed");
    }

    #[tokio::test]
    async fn take_and_reinsert_front_restore_head() {
        let (_, store) = store();
        let guild = GuildId::new("g1");
        store.append(&guild, waitlist_entry("a", None)).await.expect("append a");
        store.append(&guild, waitlist_entry("b", None)).await.expect("append b");

        let taken = store
            .take(&guild, &Identity::new("a"))
            .await
            .expect("take")
            .expect("entry a");
        assert_eq!(store.position_of(&guild, &Identity::new("b")).await.expect("pos"), Some(1));
        store.reinsert_front(&guild, taken).await.expect("reinsert");
        let order = store.list_in_order(&guild).await.expect("list");
        assert_eq!(order[0].identity.as_str(), "a");
        assert_eq!(order[1].identity.as_str(), "b");
    }

    #[tokio::test]
    async fn clear_returns_count_and_loads_persisted_queue() {
        let (repo, _) = store();
        let guild = GuildId::new("g1");
        repo.seed(&guild, vec![waitlist_entry("a", None), waitlist_entry("b", None)]);
        let store = WaitlistStore::new(repo.clone());
        assert_eq!(store.clear(&guild).await.expect("clear"), 2);
        assert_eq!(store.clear(&guild).await.expect("clear again"), 0);
        assert!(repo.stored(&guild).is_empty());
    }
}
