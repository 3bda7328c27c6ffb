// Roster entry entity
// One entrant as mirrored from the sheet

use serde::{Deserialize, Serialize};

use crate::value_objects::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub identity: Identity,
    pub display_name: String,
    pub alternate_names: Vec<String>,
    pub pronouns: Option<String>,
    pub registered: bool,
    pub checked_in: bool,
    pub team: Option<String>,
    pub store_row: u32,
}

impl RosterEntry {
    /// Clears `checked_in` on an unregistered entry. Returns true when the
    /// entry had to be corrected.
    pub fn enforce_check_in_invariant(&mut self) -> bool {
        if self.checked_in && !self.registered {
            self.checked_in = false;
            return true;
        }
        false
    }

    pub fn profile(&self) -> RegistrationProfile {
        RegistrationProfile {
            display_name: self.display_name.clone(),
            alternate_names: self.alternate_names.clone(),
            pronouns: self.pronouns.clone(),
        }
    }
}

/// The user-supplied part of a registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationProfile {
    pub display_name: String,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    #[serde(default)]
    pub pronouns: Option<String>,
}

impl RegistrationProfile {
    pub fn normalized(&self) -> Self {
        Self {
            display_name: self.display_name.trim().to_string(),
            alternate_names: self
                .alternate_names
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            pronouns: self
                .pronouns
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToString::to_string),
        }
    }
}
