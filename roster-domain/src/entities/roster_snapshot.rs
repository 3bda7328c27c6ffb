// Roster snapshot
// An immutable view of every entrant as of the last refresh or patch

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::RosterEntry;
use crate::value_objects::{same_team, Identity};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RosterSnapshot {
    pub entries: HashMap<Identity, RosterEntry>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl RosterSnapshot {
    pub fn new(entries: HashMap<Identity, RosterEntry>, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            entries,
            last_refreshed_at: Some(refreshed_at),
        }
    }

    pub fn get(&self, identity: &str) -> Option<&RosterEntry> {
        self.entries.get(identity)
    }

    pub fn all(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.values()
    }

    pub fn count_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&RosterEntry) -> bool,
    {
        self.entries.values().filter(|entry| predicate(entry)).count()
    }

    pub fn is_registered(&self, identity: &str) -> bool {
        self.get(identity).map(|entry| entry.registered).unwrap_or(false)
    }

    pub fn registered_count(&self, exclude: Option<&str>) -> usize {
        self.count_where(|entry| entry.registered && Some(entry.identity.as_str()) != exclude)
    }

    pub fn checked_in_count(&self) -> usize {
        self.count_where(|entry| entry.checked_in)
    }

    pub fn team_count(&self, team: &str, exclude: Option<&str>) -> usize {
        self.count_where(|entry| {
            entry.registered
                && same_team(entry.team.as_deref(), Some(team))
                && Some(entry.identity.as_str()) != exclude
        })
    }

    /// Entries sorted by sheet row, for stable listings.
    pub fn in_row_order(&self) -> Vec<&RosterEntry> {
        let mut entries = self.entries.values().collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.store_row);
        entries
    }

    pub fn max_row(&self) -> Option<u32> {
        self.entries.values().map(|entry| entry.store_row).max()
    }

    /// Copy-on-write patch: returns a new snapshot with `entry` upserted.
    pub fn with_entry(&self, entry: RosterEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(entry.identity.clone(), entry);
        Self {
            entries,
            last_refreshed_at: self.last_refreshed_at,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.last_refreshed_at.map(|at| now - at)
    }
}
