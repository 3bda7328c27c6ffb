use roster_domain::{RosterEntry, RosterView};

use crate::commands::parse_identity;
use crate::{AppError, AppState};

/// Current roster as held in memory. Never touches the sheet.
pub async fn list_roster(state: &AppState, guild_id: &str) -> Result<RosterView, AppError> {
    let guild = state.guild(guild_id)?;
    let config = guild.event_config().await;
    let snapshot = guild.cache.snapshot();
    let waitlisted = state.waitlist.len(&guild.id).await?;

    Ok(RosterView {
        guild: guild.id.to_string(),
        mode: config.mode.as_str().to_string(),
        max_entrants: config.max_entrants,
        registered: snapshot.registered_count(None),
        checked_in: snapshot.checked_in_count(),
        waitlisted,
        stale: guild.cache.is_stale(state.cache_ttl()),
        refresh_in_flight: guild.cache.refresh_in_flight(),
        last_refreshed_at: snapshot.last_refreshed_at,
        entries: snapshot.in_row_order().into_iter().cloned().collect(),
    })
}

pub async fn get_entry(
    state: &AppState,
    guild_id: &str,
    identity: &str,
) -> Result<Option<RosterEntry>, AppError> {
    let guild = state.guild(guild_id)?;
    let identity = parse_identity(identity)?;
    Ok(guild.cache.get(identity.as_str()))
}
