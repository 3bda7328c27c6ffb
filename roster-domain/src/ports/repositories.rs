use async_trait::async_trait;

use crate::entities::WaitlistEntry;
use crate::value_objects::GuildId;

/// Durable per-guild waitlist storage with whole-list read/replace semantics.
#[async_trait]
pub trait WaitlistRepository: Send + Sync {
    async fn load_all(&self, guild: &GuildId) -> anyhow::Result<Vec<WaitlistEntry>>;
    async fn save_all(&self, guild: &GuildId, entries: &[WaitlistEntry]) -> anyhow::Result<()>;
}
