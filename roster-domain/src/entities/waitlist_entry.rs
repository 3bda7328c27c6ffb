// Waitlist entry entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::RegistrationProfile;
use crate::value_objects::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub identity: Identity,
    pub member_ref: String,
    pub display_name: String,
    #[serde(default)]
    pub pronouns: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn new(
        identity: Identity,
        member_ref: impl Into<String>,
        profile: RegistrationProfile,
        team: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            identity,
            member_ref: member_ref.into(),
            display_name: profile.display_name,
            pronouns: profile.pronouns,
            team,
            alternate_names: profile.alternate_names,
            added_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> RegistrationProfile {
        RegistrationProfile {
            display_name: self.display_name.clone(),
            alternate_names: self.alternate_names.clone(),
            pronouns: self.pronouns.clone(),
        }
    }

    /// Applies an edit in place. `added_at` is never touched.
    pub fn apply(&mut self, update: WaitlistUpdate, now: DateTime<Utc>) {
        self.display_name = update.profile.display_name;
        self.alternate_names = update.profile.alternate_names;
        self.pronouns = update.profile.pronouns;
        self.team = update.team;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistUpdate {
    pub profile: RegistrationProfile,
    pub team: Option<String>,
}
