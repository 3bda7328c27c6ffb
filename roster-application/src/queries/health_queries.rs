use std::time::Duration;

use tokio::time::timeout;
use tracing::error;

use roster_domain::{GuildHealth, ReadinessReport};

use crate::AppState;

/// Probes waitlist storage and every guild's sheet. Stale caches are
/// reported but do not make the service unready.
pub async fn readiness(state: &AppState) -> ReadinessReport {
    let limit = Duration::from_secs(state.config.request_timeout_seconds.max(1));
    let waitlist_storage = probe(limit, "waitlist storage", state.health_service.check_waitlist_storage()).await;

    let mut guilds = Vec::with_capacity(state.guilds.len());
    for id in state.guild_ids() {
        let Some(guild) = state.guilds.get(&id) else {
            continue;
        };
        let sheet_reachable = probe(limit, "sheet", state.health_service.check_sheet(&id)).await;
        guilds.push(GuildHealth {
            guild: id.to_string(),
            sheet_reachable,
            stale: guild.cache.is_stale(state.cache_ttl()),
            refresh_in_flight: guild.cache.refresh_in_flight(),
        });
    }

    let ready = waitlist_storage && guilds.iter().all(|guild| guild.sheet_reachable);
    ReadinessReport {
        ready,
        waitlist_storage,
        guilds,
    }
}

async fn probe<F>(limit: Duration, target: &str, check: F) -> bool
where
    F: std::future::Future<Output = anyhow::Result<bool>>,
{
    match timeout(limit, check).await {
        Ok(Ok(ok)) => ok,
        Ok(Err(err)) => {
            error!("ready check for {} failed: {}", target, err);
            false
        }
        Err(_) => {
            error!("ready check for {} timed out after {}s", target, limit.as_secs());
            false
        }
    }
}
