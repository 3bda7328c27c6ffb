use tracing::warn;

use roster_domain::{RefreshOutcome, RosterEvent};

use crate::{AppError, AppState, GuildRoster};

/// Reloads a guild's roster from the sheet. Edits made directly in the sheet
/// may have freed seats, so a non-empty change set also runs promotion.
pub async fn force_refresh(state: &AppState, guild_id: &str) -> Result<RefreshOutcome, AppError> {
    let guild = state.guild(guild_id)?;
    refresh_guild(state, &guild).await
}

/// Refreshes every configured guild. Failures are logged per guild; the
/// number of guilds refreshed successfully is returned.
pub async fn refresh_all(state: &AppState) -> usize {
    let mut refreshed = 0;
    for guild in state.guilds.values() {
        match refresh_guild(state, guild).await {
            Ok(_) => refreshed += 1,
            Err(err) => warn!(guild = %guild.id, error = %err, "scheduled refresh failed"),
        }
    }
    refreshed
}

async fn refresh_guild(state: &AppState, guild: &GuildRoster) -> Result<RefreshOutcome, AppError> {
    let changes = guild.refresh().await?;
    if changes.is_empty() {
        return Ok(RefreshOutcome {
            changes,
            promoted: Vec::new(),
        });
    }
    state
        .events
        .publish(RosterEvent::RosterChanged {
            guild: guild.id.clone(),
            changes: changes.clone(),
        })
        .await;
    let promoted = state.admission.promote_or_log(guild).await;
    Ok(RefreshOutcome {
        changes,
        promoted: promoted.into_iter().map(|entry| entry.identity).collect(),
    })
}
