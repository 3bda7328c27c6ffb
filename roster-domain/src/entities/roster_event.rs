// Roster events published to the chat-layer collaborator

use serde::{Deserialize, Serialize};

use crate::entities::{ChangeSet, WaitlistEntry};
use crate::value_objects::{GuildId, Identity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RosterEvent {
    Registered {
        guild: GuildId,
        identity: Identity,
    },
    Waitlisted {
        guild: GuildId,
        identity: Identity,
        position: usize,
    },
    Promoted {
        guild: GuildId,
        entry: WaitlistEntry,
    },
    Unregistered {
        guild: GuildId,
        identity: Identity,
    },
    RosterChanged {
        guild: GuildId,
        changes: ChangeSet,
    },
}

impl RosterEvent {
    pub fn guild(&self) -> &GuildId {
        match self {
            RosterEvent::Registered { guild, .. }
            | RosterEvent::Waitlisted { guild, .. }
            | RosterEvent::Promoted { guild, .. }
            | RosterEvent::Unregistered { guild, .. }
            | RosterEvent::RosterChanged { guild, .. } => guild,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = RosterEvent::Waitlisted {
            guild: GuildId::new("g1"),
            identity: Identity::new("p1"),
            position: 2,
        };
        let value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(value["kind"], "waitlisted");
        assert_eq!(value["guild"], "g1");
        assert_eq!(value["position"], 2);
    }
}
