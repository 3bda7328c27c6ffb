use tracing::info;

use roster_domain::{CapacityOutcome, CapacityUpdate};

use crate::{AppError, AppState};

/// Changes the seat limits of a running event. Raising a limit runs a
/// promotion pass immediately.
pub async fn update_capacity(
    state: &AppState,
    guild_id: &str,
    update: CapacityUpdate,
) -> Result<CapacityOutcome, AppError> {
    let guild = state.guild(guild_id)?;
    let mut config = guild.event_config().await;

    if let Some(max_entrants) = update.max_entrants {
        if max_entrants == 0 {
            return Err(AppError::BadRequest("max_entrants must be at least 1".to_string()));
        }
        config.max_entrants = max_entrants;
    }
    if let Some(max_per_team) = update.max_per_team {
        if max_per_team == 0 {
            return Err(AppError::BadRequest("max_per_team must be at least 1".to_string()));
        }
        config.max_per_team = max_per_team;
    }

    guild.set_event_config(config.clone()).await;
    info!(
        guild = %guild.id,
        max_entrants = config.max_entrants,
        max_per_team = config.max_per_team,
        "capacity updated"
    );

    guild.ensure_fresh(state.cache_ttl()).await?;
    let promoted = state.admission.promote_or_log(&guild).await;
    Ok(CapacityOutcome {
        config,
        promoted: promoted.into_iter().map(|entry| entry.identity).collect(),
    })
}
