use std::collections::HashMap;

use roster_domain::{GuildId, RosterEvent};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

const CHANNEL_BUFFER: usize = 64;

/// Per-guild fan-out of roster events to the chat layer. Publishing never
/// blocks; events with no subscriber are dropped.
#[derive(Default)]
pub struct RosterEventHub {
    channels: RwLock<HashMap<GuildId, broadcast::Sender<RosterEvent>>>,
}

impl RosterEventHub {
    pub async fn subscribe(&self, guild: &GuildId) -> broadcast::Receiver<RosterEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(guild.clone())
            .or_insert_with(|| {
                let (tx, _rx) = broadcast::channel(CHANNEL_BUFFER);
                tx
            })
            .subscribe()
    }

    pub async fn publish(&self, event: RosterEvent) {
        let channels = self.channels.read().await;
        match channels.get(event.guild()) {
            Some(tx) => {
                let _ = tx.send(event);
            }
            None => debug!(guild = %event.guild(), "no roster event subscribers"),
        }
    }
}
