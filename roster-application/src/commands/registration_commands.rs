use chrono::Utc;
use tracing::info;

use roster_domain::{
    non_empty, CapacityValidator, Decision, RegistrationOutcome, RegistrationRequest, RosterEvent,
    UnregisterOutcome, WaitlistEntry, WaitlistUpdate,
};

use crate::admission::registration_draft;
use crate::commands::parse_identity;
use crate::{AppError, AppState};

/// Registers an entrant, or queues them when the event is full. A user who
/// is already waitlisted has their queued entry edited in place.
pub async fn register(
    state: &AppState,
    guild_id: &str,
    request: RegistrationRequest,
) -> Result<RegistrationOutcome, AppError> {
    let guild = state.guild(guild_id)?;
    let identity = parse_identity(&request.identity)?;
    let profile = request.profile.normalized();
    if profile.display_name.is_empty() {
        return Err(AppError::BadRequest(
            "display_name must not be empty".to_string(),
        ));
    }
    let config = guild.event_config().await;
    let team = if config.is_paired() {
        request.team.as_deref().and_then(non_empty)
    } else {
        None
    };

    let edit = WaitlistUpdate {
        profile: profile.clone(),
        team: team.clone(),
    };
    if let Some(position) = state.waitlist.update(&guild.id, &identity, edit).await? {
        info!(guild = %guild.id, identity = %identity, position, "updated waitlist entry");
        return Ok(RegistrationOutcome::Waitlisted {
            position,
            updated: true,
        });
    }

    let snapshot = guild.ensure_fresh(state.cache_ttl()).await?;
    let existing = snapshot.get(identity.as_str());
    let decision = CapacityValidator::new(&config, &snapshot)
        .can_register(team.as_deref(), Some(identity.as_str()));

    match decision {
        Decision::Allowed => {
            let draft = registration_draft(&config, &identity, profile, team, existing);
            let hint = existing.map(|entry| entry.store_row);
            let written = guild.sheet.write_entry(&config, draft, hint).await?;
            guild.cache.apply(written.clone()).await;
            info!(
                guild = %guild.id,
                identity = %identity,
                row = written.store_row,
                "registered"
            );
            state
                .events
                .publish(RosterEvent::Registered {
                    guild: guild.id.clone(),
                    identity: identity.clone(),
                })
                .await;
            Ok(RegistrationOutcome::Registered { entry: written })
        }
        Decision::Denied {
            is_full: true,
            reason,
        } => {
            let entry = WaitlistEntry::new(
                identity.clone(),
                request.member_ref,
                profile,
                team,
                Utc::now(),
            );
            let position = state.waitlist.append(&guild.id, entry).await?;
            state.metrics.record_waitlist_append();
            info!(
                guild = %guild.id,
                identity = %identity,
                position,
                reason = %reason,
                "event full, waitlisted"
            );
            state
                .events
                .publish(RosterEvent::Waitlisted {
                    guild: guild.id.clone(),
                    identity,
                    position,
                })
                .await;
            Ok(RegistrationOutcome::Waitlisted {
                position,
                updated: false,
            })
        }
        Decision::Denied { reason, .. } => Ok(RegistrationOutcome::Denied {
            reason: reason.to_string(),
        }),
    }
}

/// Clears both flags on the entrant's row and drops any waitlist entry.
/// Freed seats are offered to the waitlist straight away.
pub async fn unregister(
    state: &AppState,
    guild_id: &str,
    identity: &str,
) -> Result<UnregisterOutcome, AppError> {
    let guild = state.guild(guild_id)?;
    let identity = parse_identity(identity)?;

    let removed_from_waitlist = state.waitlist.remove(&guild.id, &identity).await?;
    let snapshot = guild.ensure_fresh(state.cache_ttl()).await?;
    let Some(entry) = snapshot.get(identity.as_str()).filter(|entry| entry.registered) else {
        return Ok(UnregisterOutcome {
            removed_from_waitlist,
            ..UnregisterOutcome::default()
        });
    };

    let config = guild.event_config().await;
    let row = guild
        .sheet
        .write_flags(
            &config,
            &identity,
            Some(entry.store_row),
            Some(false),
            Some(false),
        )
        .await?;
    let mut updated = entry.clone();
    updated.registered = false;
    updated.checked_in = false;
    updated.store_row = row;
    guild.cache.apply(updated).await;
    info!(guild = %guild.id, identity = %identity, "unregistered");
    state
        .events
        .publish(RosterEvent::Unregistered {
            guild: guild.id.clone(),
            identity,
        })
        .await;

    let promoted = state.admission.promote_or_log(&guild).await;
    Ok(UnregisterOutcome {
        was_registered: true,
        removed_from_waitlist,
        promoted: promoted.into_iter().map(|entry| entry.identity).collect(),
    })
}
