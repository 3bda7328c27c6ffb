// Change detection between two roster maps

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::entities::RosterEntry;
use crate::value_objects::Identity;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: BTreeSet<Identity>,
    pub removed: BTreeSet<Identity>,
    pub updated: BTreeSet<Identity>,
}

impl ChangeSet {
    pub fn diff(
        old: &HashMap<Identity, RosterEntry>,
        new: &HashMap<Identity, RosterEntry>,
    ) -> Self {
        let mut changes = ChangeSet::default();
        for (identity, entry) in new {
            match old.get(identity) {
                None => {
                    changes.added.insert(identity.clone());
                }
                Some(previous) if previous != entry => {
                    changes.updated.insert(identity.clone());
                }
                Some(_) => {}
            }
        }
        for identity in old.keys() {
            if !new.contains_key(identity) {
                changes.removed.insert(identity.clone());
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.updated.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, checked_in: bool) -> (Identity, RosterEntry) {
        let identity = Identity::new(id);
        (
            identity.clone(),
            RosterEntry {
                identity,
                display_name: id.to_string(),
                alternate_names: Vec::new(),
                pronouns: None,
                registered: true,
                checked_in,
                team: None,
                store_row: 3,
            },
        )
    }

    #[test]
    fn diff_classifies_added_removed_updated() {
        let old = HashMap::from([entry("a", false), entry("b", false)]);
        let new = HashMap::from([entry("b", true), entry("c", false)]);
        let changes = ChangeSet::diff(&old, &new);
        assert!(changes.added.contains("c"));
        assert!(changes.removed.contains("a"));
        assert!(changes.updated.contains("b"));
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn identical_maps_produce_empty_diff() {
        let old = HashMap::from([entry("a", false)]);
        let changes = ChangeSet::diff(&old, &old.clone());
        assert!(changes.is_empty());
    }
}
