//! Waitlist promotion.
//!
//! A promotion pass moves waitlisted entrants into the roster while seats
//! remain. Each round works on a fresh view of the cache, so seats freed or
//! taken by concurrent commands are picked up between rounds. Entries are
//! taken off the waitlist before the sheet write and put back at the head
//! if the write fails.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use roster_domain::{
    CapacityValidator, GuildEventConfig, Identity, RegistrationProfile, RosterEntry, RosterEvent,
    RosterResult, WaitlistEntry,
};

use crate::{GuildRoster, Metrics, RosterEventHub, WaitlistStore};

pub struct AdmissionEngine {
    waitlist: Arc<WaitlistStore>,
    events: Arc<RosterEventHub>,
    metrics: Arc<Metrics>,
    max_rounds: u32,
}

impl AdmissionEngine {
    pub fn new(
        waitlist: Arc<WaitlistStore>,
        events: Arc<RosterEventHub>,
        metrics: Arc<Metrics>,
        max_rounds: u32,
    ) -> Self {
        Self {
            waitlist,
            events,
            metrics,
            max_rounds: max_rounds.max(1),
        }
    }

    /// Runs one promotion pass and returns the entries admitted, in order.
    /// A failed sheet write aborts the pass with the error after the entry
    /// has been restored to the head of the queue.
    pub async fn promote(&self, guild: &GuildRoster) -> RosterResult<Vec<WaitlistEntry>> {
        let _pass = guild.lock_promotions().await;
        let mut promoted = Vec::new();

        for round in 0..self.max_rounds {
            let config = guild.event_config().await;
            let snapshot = guild.cache.snapshot();
            let validator = CapacityValidator::new(&config, &snapshot);
            let available = validator.available_seats();
            if available == 0 {
                debug!(guild = %guild.id, round, "no seats available, promotion pass done");
                return Ok(promoted);
            }

            let queue = self.waitlist.list_in_order(&guild.id).await?;
            if queue.is_empty() {
                return Ok(promoted);
            }

            let (stale, pending): (Vec<_>, Vec<_>) = queue
                .into_iter()
                .partition(|entry| snapshot.is_registered(entry.identity.as_str()));
            for entry in &stale {
                self.waitlist.remove(&guild.id, &entry.identity).await?;
                info!(guild = %guild.id, identity = %entry.identity, "dropped waitlist entry already on the roster");
            }

            let Some(candidate) = pending
                .iter()
                .find(|entry| promotable(&config, &validator, entry, available))
            else {
                debug!(guild = %guild.id, round, waiting = pending.len(), "no promotable waitlist entry");
                return Ok(promoted);
            };

            let Some(entry) = self.waitlist.take(&guild.id, &candidate.identity).await? else {
                continue;
            };

            let existing = snapshot.get(entry.identity.as_str());
            let draft = registration_draft(
                &config,
                &entry.identity,
                entry.profile(),
                entry.team.clone(),
                existing,
            );
            let hint = existing.map(|existing| existing.store_row);
            match guild.sheet.write_entry(&config, draft, hint).await {
                Ok(written) => {
                    guild.cache.apply(written).await;
                    self.metrics.record_promotions(1);
                    info!(
                        guild = %guild.id,
                        identity = %entry.identity,
                        team = entry.team.as_deref().unwrap_or(""),
                        round,
                        "promoted from waitlist"
                    );
                    self.events
                        .publish(RosterEvent::Promoted {
                            guild: guild.id.clone(),
                            entry: entry.clone(),
                        })
                        .await;
                    promoted.push(entry);
                }
                Err(err) => {
                    self.metrics.record_promotion_rollback();
                    error!(
                        guild = %guild.id,
                        identity = %entry.identity,
                        error = %err,
                        "promotion write failed, restoring waitlist head"
                    );
                    if let Err(restore_err) = self.waitlist.reinsert_front(&guild.id, entry).await {
                        error!(guild = %guild.id, error = %restore_err, "failed to restore waitlist entry");
                        return Err(restore_err);
                    }
                    return Err(err);
                }
            }
        }

        warn!(guild = %guild.id, rounds = self.max_rounds, "promotion pass hit round limit");
        Ok(promoted)
    }

    /// Promotion triggered as a side effect of another command. Failures are
    /// logged and never fail the triggering command.
    pub async fn promote_or_log(&self, guild: &GuildRoster) -> Vec<WaitlistEntry> {
        match self.promote(guild).await {
            Ok(promoted) => promoted,
            Err(err) => {
                error!(guild = %guild.id, error = %err, "promotion pass aborted");
                Vec::new()
            }
        }
    }
}

/// A team entry is only admitted when its team can take it and the seats
/// needed to complete that team are still free.
fn promotable(
    config: &GuildEventConfig,
    validator: &CapacityValidator<'_>,
    entry: &WaitlistEntry,
    available: u32,
) -> bool {
    let team = if config.is_paired() {
        entry.team.as_deref().map(str::trim).filter(|team| !team.is_empty())
    } else {
        None
    };
    if !validator
        .can_register(team, Some(entry.identity.as_str()))
        .is_allowed()
    {
        return false;
    }
    match team {
        Some(team) => validator.seats_to_complete(team) <= available,
        None => true,
    }
}

/// Builds the row written for a new or returning registrant.
pub(crate) fn registration_draft(
    config: &GuildEventConfig,
    identity: &Identity,
    profile: RegistrationProfile,
    team: Option<String>,
    existing: Option<&RosterEntry>,
) -> RosterEntry {
    let checked_in = existing
        .map(|entry| entry.registered && entry.checked_in)
        .unwrap_or(false);
    RosterEntry {
        identity: identity.clone(),
        display_name: profile.display_name,
        alternate_names: profile.alternate_names,
        pronouns: profile.pronouns,
        registered: true,
        checked_in,
        team: if config.is_paired() { team } else { None },
        store_row: existing.map(|entry| entry.store_row).unwrap_or(0),
    }
}
