// Request and response models for the roster commands

use serde::{Deserialize, Serialize};

use crate::entities::{ChangeSet, GuildEventConfig, RegistrationProfile, RosterEntry, WaitlistEntry};
use crate::value_objects::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub identity: String,
    /// Chat-layer handle used for notifications after promotion.
    #[serde(default)]
    pub member_ref: String,
    #[serde(flatten)]
    pub profile: RegistrationProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    Registered { entry: RosterEntry },
    Waitlisted { position: usize, updated: bool },
    Denied { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnregisterOutcome {
    pub was_registered: bool,
    pub removed_from_waitlist: bool,
    pub promoted: Vec<Identity>,
}

impl UnregisterOutcome {
    pub fn changed(&self) -> bool {
        self.was_registered || self.removed_from_waitlist
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckInOutcome {
    CheckedIn,
    CheckedOut,
    Unchanged,
    Denied { reason: String },
}

impl CheckInOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, CheckInOutcome::CheckedIn | CheckInOutcome::CheckedOut)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSummary {
    pub reset: usize,
    pub promoted: Vec<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityUpdate {
    #[serde(default)]
    pub max_entrants: Option<u32>,
    #[serde(default)]
    pub max_per_team: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityOutcome {
    pub config: GuildEventConfig,
    pub promoted: Vec<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub changes: ChangeSet,
    pub promoted: Vec<Identity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterView {
    pub guild: String,
    pub mode: String,
    pub max_entrants: u32,
    pub registered: usize,
    pub checked_in: usize,
    pub waitlisted: usize,
    pub stale: bool,
    pub refresh_in_flight: bool,
    pub last_refreshed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub entries: Vec<RosterEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistView {
    pub guild: String,
    pub entries: Vec<WaitlistEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistPosition {
    pub identity: Identity,
    pub position: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearOutcome {
    pub cleared: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildHealth {
    pub guild: String,
    pub sheet_reachable: bool,
    pub stale: bool,
    pub refresh_in_flight: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub ready: bool,
    pub waitlist_storage: bool,
    pub guilds: Vec<GuildHealth>,
}
