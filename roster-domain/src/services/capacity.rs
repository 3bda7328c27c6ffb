//! Capacity checks for registration and check-in.
//!
//! Everything here is a pure read of a [`RosterSnapshot`]; callers decide
//! what to do with a denial (waitlist, error message, skip).

use std::fmt;

use serde::Serialize;

use crate::entities::{EventMode, GuildEventConfig, RosterSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    EventFull { max_entrants: u32 },
    TeamFull { team: String, max_per_team: u32 },
    NotRegistered,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::EventFull { max_entrants } => {
                write!(f, "event is full ({max_entrants} entrants)")
            }
            DenialReason::TeamFull { team, max_per_team } => {
                write!(f, "team '{team}' already has {max_per_team} members")
            }
            DenialReason::NotRegistered => f.write_str("entrant is not registered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Denied { reason: DenialReason, is_full: bool },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// True when the denial should route the caller into the waitlist.
    pub fn is_full(&self) -> bool {
        matches!(self, Decision::Denied { is_full: true, .. })
    }
}

pub struct CapacityValidator<'a> {
    config: &'a GuildEventConfig,
    snapshot: &'a RosterSnapshot,
}

impl<'a> CapacityValidator<'a> {
    pub fn new(config: &'a GuildEventConfig, snapshot: &'a RosterSnapshot) -> Self {
        Self { config, snapshot }
    }

    pub fn registered_count(&self, exclude: Option<&str>) -> u32 {
        self.snapshot.registered_count(exclude) as u32
    }

    pub fn event_full(&self, exclude: Option<&str>) -> bool {
        self.registered_count(exclude) >= self.config.max_entrants
    }

    pub fn available_seats(&self) -> u32 {
        self.config
            .max_entrants
            .saturating_sub(self.registered_count(None))
    }

    pub fn team_members(&self, team: &str, exclude: Option<&str>) -> u32 {
        self.snapshot.team_count(team, exclude) as u32
    }

    pub fn team_full(&self, team: &str, exclude: Option<&str>) -> bool {
        self.team_members(team, exclude) >= self.config.max_per_team
    }

    /// Seats a team still needs before it is complete.
    pub fn seats_to_complete(&self, team: &str) -> u32 {
        self.config
            .max_per_team
            .saturating_sub(self.team_members(team, None))
    }

    /// Individual events deny only when full. In paired events a team that
    /// already has `max_per_team` members is denied even with seats free,
    /// while a partial team may still add its partner to a full event.
    /// `exclude` leaves that identity out of both counts.
    pub fn can_register(&self, candidate_team: Option<&str>, exclude: Option<&str>) -> Decision {
        let full = self.event_full(exclude);
        match self.config.mode {
            EventMode::Individual => {
                if full {
                    return self.event_full_denial();
                }
                Decision::Allowed
            }
            EventMode::Paired => {
                let team = candidate_team.map(str::trim).filter(|team| !team.is_empty());
                match team {
                    Some(team) if self.team_full(team, exclude) => Decision::Denied {
                        reason: DenialReason::TeamFull {
                            team: team.to_string(),
                            max_per_team: self.config.max_per_team,
                        },
                        is_full: full,
                    },
                    // A partially filled team may still take its partner when the event is full.
                    Some(_) => Decision::Allowed,
                    None if full => self.event_full_denial(),
                    None => Decision::Allowed,
                }
            }
        }
    }

    pub fn can_check_in(&self, identity: &str) -> Decision {
        if self.snapshot.is_registered(identity) {
            Decision::Allowed
        } else {
            Decision::Denied {
                reason: DenialReason::NotRegistered,
                is_full: false,
            }
        }
    }

    fn event_full_denial(&self) -> Decision {
        Decision::Denied {
            reason: DenialReason::EventFull {
                max_entrants: self.config.max_entrants,
            },
            is_full: true,
        }
    }
}
