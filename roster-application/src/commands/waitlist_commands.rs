use tracing::info;

use roster_domain::ClearOutcome;

use crate::commands::parse_identity;
use crate::{AppError, AppState};

pub async fn remove_from_waitlist(
    state: &AppState,
    guild_id: &str,
    identity: &str,
) -> Result<bool, AppError> {
    let guild = state.guild(guild_id)?;
    let identity = parse_identity(identity)?;
    let removed = state.waitlist.remove(&guild.id, &identity).await?;
    if removed {
        info!(guild = %guild.id, identity = %identity, "removed from waitlist");
    }
    Ok(removed)
}

pub async fn clear_waitlist(state: &AppState, guild_id: &str) -> Result<ClearOutcome, AppError> {
    let guild = state.guild(guild_id)?;
    let cleared = state.waitlist.clear(&guild.id).await?;
    Ok(ClearOutcome { cleared })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{waitlist_entry, TestContext};
    use roster_domain::GuildEventConfig;

    #[tokio::test]
    async fn manual_removal_and_clear() {
        let ctx = TestContext::new(GuildEventConfig::default());
        ctx.enqueue(vec![
            waitlist_entry("w1", None),
            waitlist_entry("w2", None),
            waitlist_entry("w3", None),
        ])
        .await;

        assert!(remove_from_waitlist(&ctx.state, "g1", "w2").await.expect("remove"));
        assert!(!remove_from_waitlist(&ctx.state, "g1", "w2").await.expect("remove again"));
        let cleared = clear_waitlist(&ctx.state, "g1").await.expect("clear");
        assert_eq!(cleared.cleared, 2);
        assert!(ctx.repo.stored(&ctx.guild).is_empty());
    }

    #[tokio::test]
    async fn blank_identity_is_rejected() {
        let ctx = TestContext::new(GuildEventConfig::default());
        let err = remove_from_waitlist(&ctx.state, "g1", "  ")
            .await
            .expect_err("blank identity");
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
