use tracing::info;

use roster_domain::{ChangeSet, ResetSummary, RosterEvent};

use crate::{AppError, AppState};

/// Unregisters and checks out every entrant in one batch write, then offers
/// the emptied event to the waitlist.
pub async fn reset_all(state: &AppState, guild_id: &str) -> Result<ResetSummary, AppError> {
    let guild = state.guild(guild_id)?;
    guild.refresh().await?;

    let reset = guild
        .cache
        .all()
        .into_iter()
        .filter(|entry| entry.registered || entry.checked_in)
        .collect::<Vec<_>>();
    if reset.is_empty() {
        return Ok(ResetSummary::default());
    }
    let rows = reset
        .iter()
        .map(|entry| entry.store_row)
        .collect::<Vec<_>>();

    guild
        .sheet
        .write_bulk_flags(&rows, Some(false), Some(false))
        .await?;

    let changes = ChangeSet {
        updated: reset.iter().map(|entry| entry.identity.clone()).collect(),
        ..ChangeSet::default()
    };
    let patched = reset
        .into_iter()
        .map(|mut entry| {
            entry.registered = false;
            entry.checked_in = false;
            entry
        })
        .collect();
    // Waits out any refresh that fetched before the write.
    guild.cache.apply_all(patched).await;
    info!(guild = %guild.id, reset = rows.len(), "roster reset");
    state
        .events
        .publish(RosterEvent::RosterChanged {
            guild: guild.id.clone(),
            changes,
        })
        .await;

    let promoted = state.admission.promote_or_log(&guild).await;
    Ok(ResetSummary {
        reset: rows.len(),
        promoted: promoted.into_iter().map(|entry| entry.identity).collect(),
    })
}

/// Checks everyone out while keeping registrations.
pub async fn reset_check_ins(state: &AppState, guild_id: &str) -> Result<usize, AppError> {
    let guild = state.guild(guild_id)?;
    let snapshot = guild.ensure_fresh(state.cache_ttl()).await?;

    let checked_in = snapshot
        .in_row_order()
        .into_iter()
        .filter(|entry| entry.checked_in)
        .cloned()
        .collect::<Vec<_>>();
    if checked_in.is_empty() {
        return Ok(0);
    }
    let rows = checked_in
        .iter()
        .map(|entry| entry.store_row)
        .collect::<Vec<_>>();
    guild.sheet.write_bulk_flags(&rows, None, Some(false)).await?;

    let count = checked_in.len();
    let patched = checked_in
        .into_iter()
        .map(|mut entry| {
            entry.checked_in = false;
            entry
        })
        .collect();
    guild.cache.apply_all(patched).await;
    info!(guild = %guild.id, count, "check-ins reset");
    Ok(count)
}
