use roster_domain::{WaitlistPosition, WaitlistView};

use crate::commands::parse_identity;
use crate::{AppError, AppState};

pub async fn waitlist_position_of(
    state: &AppState,
    guild_id: &str,
    identity: &str,
) -> Result<WaitlistPosition, AppError> {
    let guild = state.guild(guild_id)?;
    let identity = parse_identity(identity)?;
    let position = state.waitlist.position_of(&guild.id, &identity).await?;
    Ok(WaitlistPosition { identity, position })
}

pub async fn list_waitlist(state: &AppState, guild_id: &str) -> Result<WaitlistView, AppError> {
    let guild = state.guild(guild_id)?;
    let entries = state.waitlist.list_in_order(&guild.id).await?;
    Ok(WaitlistView {
        guild: guild.id.to_string(),
        entries,
    })
}
