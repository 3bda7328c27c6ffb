use tracing::info;

use roster_domain::{CapacityValidator, CheckInOutcome, Decision};

use crate::commands::parse_identity;
use crate::{AppError, AppState};

pub async fn check_in(
    state: &AppState,
    guild_id: &str,
    identity: &str,
) -> Result<CheckInOutcome, AppError> {
    set_checked_in(state, guild_id, identity, true).await
}

pub async fn check_out(
    state: &AppState,
    guild_id: &str,
    identity: &str,
) -> Result<CheckInOutcome, AppError> {
    set_checked_in(state, guild_id, identity, false).await
}

async fn set_checked_in(
    state: &AppState,
    guild_id: &str,
    identity: &str,
    checked_in: bool,
) -> Result<CheckInOutcome, AppError> {
    let guild = state.guild(guild_id)?;
    let identity = parse_identity(identity)?;
    let config = guild.event_config().await;
    let snapshot = guild.ensure_fresh(state.cache_ttl()).await?;

    if let Decision::Denied { reason, .. } =
        CapacityValidator::new(&config, &snapshot).can_check_in(identity.as_str())
    {
        return Ok(CheckInOutcome::Denied {
            reason: reason.to_string(),
        });
    }
    let Some(entry) = snapshot.get(identity.as_str()) else {
        return Ok(CheckInOutcome::Unchanged);
    };
    if entry.checked_in == checked_in {
        return Ok(CheckInOutcome::Unchanged);
    }

    let row = guild
        .sheet
        .write_flags(&config, &identity, Some(entry.store_row), None, Some(checked_in))
        .await?;
    let mut updated = entry.clone();
    updated.checked_in = checked_in;
    updated.store_row = row;
    guild.cache.apply(updated).await;
    info!(guild = %guild.id, identity = %identity, checked_in, "check-in flag updated");

    Ok(if checked_in {
        CheckInOutcome::CheckedIn
    } else {
        CheckInOutcome::CheckedOut
    })
}
