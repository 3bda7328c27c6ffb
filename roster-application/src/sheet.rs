//! Row-level gateway between the roster layout and a [`SheetClient`].
//!
//! All remote calls go through the shared [`RetryingInvoker`]. String cells
//! are parsed here and nowhere else; callers only ever see typed
//! [`RosterEntry`] values.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use roster_domain::{
    encode_flag, join_list, non_empty, parse_flag, split_list, CellRef, CellUpdate, ColumnLayout,
    GuildEventConfig, Identity, RosterEntry, RosterError, RosterResult, SheetClient, StoreError,
};

use crate::{Metrics, RetryingInvoker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLookup {
    Found(u32),
    Missing { next_free: u32 },
}

pub struct RosterSheet {
    client: Arc<dyn SheetClient>,
    invoker: Arc<RetryingInvoker>,
    columns: ColumnLayout,
    metrics: Arc<Metrics>,
    // Serializes row allocation and writes within this process.
    write_lock: Mutex<()>,
}

impl RosterSheet {
    pub fn new(
        client: Arc<dyn SheetClient>,
        invoker: Arc<RetryingInvoker>,
        columns: ColumnLayout,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            client,
            invoker,
            columns,
            metrics,
            write_lock: Mutex::new(()),
        }
    }

    pub fn columns(&self) -> &ColumnLayout {
        &self.columns
    }

    pub async fn fetch_entries(
        &self,
        config: &GuildEventConfig,
    ) -> Result<HashMap<Identity, RosterEntry>, StoreError> {
        let columns = FetchedColumns {
            identities: self.read_column(&self.columns.identity).await?,
            display_names: self.read_column(&self.columns.display_name).await?,
            registered: self.read_column(&self.columns.registered).await?,
            checked_in: self.read_column(&self.columns.checked_in).await?,
            alternate_names: self.read_column(&self.columns.alternate_names).await?,
            pronouns: self.read_column(&self.columns.pronouns).await?,
            teams: match (config.is_paired(), &self.columns.team) {
                (true, Some(team)) => self.read_column(team).await?,
                _ => Vec::new(),
            },
        };
        Ok(build_entries(config, &columns))
    }

    /// Finds the current row of `identity`. A cached `hint` is verified with a
    /// single cell read; on mismatch the identity column is re-scanned.
    pub async fn find_row(
        &self,
        config: &GuildEventConfig,
        identity: &Identity,
        hint: Option<u32>,
    ) -> Result<RowLookup, StoreError> {
        if let Some(row) = hint.filter(|row| *row >= config.first_data_row()) {
            let cell = CellRef::new(&self.columns.identity, row);
            let value = self
                .invoker
                .invoke("get_cell", || self.client.get_cell(&cell))
                .await?;
            if Identity::new(&value) == *identity {
                return Ok(RowLookup::Found(row));
            }
            warn!(
                identity = %identity,
                row,
                found = %value,
                "roster row moved, rescanning identity column"
            );
        }
        let column = self.read_column(&self.columns.identity).await?;
        Ok(locate(config, &column, identity))
    }

    /// Writes every column of `draft`, reusing its row when the sheet still
    /// has it or claiming the first free row otherwise.
    pub async fn write_entry(
        &self,
        config: &GuildEventConfig,
        mut draft: RosterEntry,
        hint: Option<u32>,
    ) -> RosterResult<RosterEntry> {
        let _guard = self.write_lock.lock().await;
        let row = match self.find_row(config, &draft.identity, hint).await? {
            RowLookup::Found(row) => row,
            RowLookup::Missing { next_free } => next_free,
        };
        draft.store_row = row;
        draft.enforce_check_in_invariant();
        let updates = self.entry_cells(config, &draft);
        self.write_cells("write_entry", &updates).await?;
        Ok(draft)
    }

    /// Updates the flag columns of an existing row. A missing identity is a
    /// consistency conflict: the caller's view of the roster is out of date.
    pub async fn write_flags(
        &self,
        config: &GuildEventConfig,
        identity: &Identity,
        hint: Option<u32>,
        registered: Option<bool>,
        checked_in: Option<bool>,
    ) -> RosterResult<u32> {
        let _guard = self.write_lock.lock().await;
        let row = match self.find_row(config, identity, hint).await? {
            RowLookup::Found(row) => row,
            RowLookup::Missing { .. } => {
                return Err(RosterError::Conflict {
                    identity: identity.to_string(),
                    detail: "identity no longer present in the sheet".to_string(),
                })
            }
        };
        let mut updates = Vec::new();
        if let Some(value) = registered {
            updates.push(CellUpdate::flag(&self.columns.registered, row, value));
        }
        if let Some(value) = checked_in {
            updates.push(CellUpdate::flag(&self.columns.checked_in, row, value));
        }
        if !updates.is_empty() {
            self.write_cells("write_flags", &updates).await?;
        }
        Ok(row)
    }

    /// Sets the flag columns for many rows in one batch write.
    pub async fn write_bulk_flags(
        &self,
        rows: &[u32],
        registered: Option<bool>,
        checked_in: Option<bool>,
    ) -> RosterResult<()> {
        let mut updates = Vec::with_capacity(rows.len() * 2);
        for row in rows {
            if let Some(value) = registered {
                updates.push(CellUpdate::flag(&self.columns.registered, *row, value));
            }
            if let Some(value) = checked_in {
                updates.push(CellUpdate::flag(&self.columns.checked_in, *row, value));
            }
        }
        if updates.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        self.write_cells("write_bulk_flags", &updates).await?;
        Ok(())
    }

    async fn read_column(&self, column: &str) -> Result<Vec<String>, StoreError> {
        self.invoker
            .invoke("get_column", || self.client.get_column(column))
            .await
    }

    async fn write_cells(&self, label: &str, updates: &[CellUpdate]) -> Result<(), StoreError> {
        let result = if let [single] = updates {
            self.invoker
                .invoke(label, || self.client.set_cell(&single.cell, &single.value))
                .await
        } else {
            self.invoker
                .invoke(label, || self.client.set_cells(updates))
                .await
        };
        if result.is_err() {
            self.metrics.record_store_write_error();
        }
        result
    }

    fn entry_cells(&self, config: &GuildEventConfig, entry: &RosterEntry) -> Vec<CellUpdate> {
        let row = entry.store_row;
        let mut updates = vec![
            CellUpdate::new(&self.columns.identity, row, entry.identity.as_str()),
            CellUpdate::new(&self.columns.display_name, row, entry.display_name.as_str()),
            CellUpdate::new(&self.columns.registered, row, encode_flag(entry.registered)),
            CellUpdate::new(&self.columns.checked_in, row, encode_flag(entry.checked_in)),
            CellUpdate::new(&self.columns.alternate_names, row, join_list(&entry.alternate_names)),
            CellUpdate::new(
                &self.columns.pronouns,
                row,
                entry.pronouns.clone().unwrap_or_default(),
            ),
        ];
        if let (true, Some(team_column)) = (config.is_paired(), &self.columns.team) {
            updates.push(CellUpdate::new(
                team_column,
                row,
                entry.team.clone().unwrap_or_default(),
            ));
        }
        updates
    }
}

struct FetchedColumns {
    identities: Vec<String>,
    display_names: Vec<String>,
    registered: Vec<String>,
    checked_in: Vec<String>,
    alternate_names: Vec<String>,
    pronouns: Vec<String>,
    teams: Vec<String>,
}

fn cell(column: &[String], index: usize) -> &str {
    column.get(index).map(String::as_str).unwrap_or("")
}

fn build_entries(config: &GuildEventConfig, columns: &FetchedColumns) -> HashMap<Identity, RosterEntry> {
    let mut entries: HashMap<Identity, RosterEntry> = HashMap::new();
    let start = config.header_row_offset as usize;
    for index in start..columns.identities.len() {
        let Some(raw_identity) = non_empty(cell(&columns.identities, index)) else {
            continue;
        };
        let identity = Identity::new(raw_identity);
        let row = index as u32 + 1;
        if let Some(existing) = entries.get(&identity) {
            warn!(
                identity = %identity,
                row,
                first_row = existing.store_row,
                "duplicate identity in sheet, keeping first row"
            );
            continue;
        }
        let mut entry = RosterEntry {
            identity: identity.clone(),
            display_name: cell(&columns.display_names, index).trim().to_string(),
            alternate_names: split_list(cell(&columns.alternate_names, index)),
            pronouns: non_empty(cell(&columns.pronouns, index)),
            registered: parse_flag(cell(&columns.registered, index)),
            checked_in: parse_flag(cell(&columns.checked_in, index)),
            team: if config.is_paired() {
                non_empty(cell(&columns.teams, index))
            } else {
                None
            },
            store_row: row,
        };
        if entry.enforce_check_in_invariant() {
            warn!(identity = %identity, row, "checked in without registration, ignoring check-in");
        }
        entries.insert(identity, entry);
    }
    entries
}

fn locate(config: &GuildEventConfig, identities: &[String], identity: &Identity) -> RowLookup {
    let start = config.header_row_offset as usize;
    let mut first_blank = None;
    for index in start..identities.len() {
        let value = identities[index].trim();
        if value.is_empty() {
            first_blank.get_or_insert(index);
            continue;
        }
        if value == identity.as_str() {
            return RowLookup::Found(index as u32 + 1);
        }
    }
    let free_index = first_blank.unwrap_or_else(|| identities.len().max(start));
    RowLookup::Missing {
        next_free: free_index as u32 + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSheet, test_invoker};
    use roster_domain::EventMode;

    fn config(mode: EventMode) -> GuildEventConfig {
        GuildEventConfig {
            mode,
            max_entrants: 8,
            max_per_team: 2,
            header_row_offset: 2,
        }
    }

    fn column(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn roster_sheet(fake: Arc<FakeSheet>) -> RosterSheet {
        RosterSheet::new(
            fake,
            test_invoker(),
            ColumnLayout::default(),
            Arc::new(Metrics::default()),
        )
    }

    #[test]
    fn locate_finds_existing_identity() {
        let ids = column(&["header", "sub", "a", "", "b"]);
        let lookup = locate(&config(EventMode::Individual), &ids, &Identity::new("b"));
        assert_eq!(lookup, RowLookup::Found(5));
    }

    #[test]
    fn locate_prefers_first_blank_row() {
        let ids = column(&["header", "sub", "a", "", "b"]);
        let lookup = locate(&config(EventMode::Individual), &ids, &Identity::new("z"));
        assert_eq!(lookup, RowLookup::Missing { next_free: 4 });
    }

    #[test]
    fn locate_appends_after_last_row() {
        let ids = column(&["header"]);
        let lookup = locate(&config(EventMode::Individual), &ids, &Identity::new("z"));
        assert_eq!(lookup, RowLookup::Missing { next_free: 3 });
    }

    #[tokio::test]
    async fn fetch_entries_parses_flags_and_enforces_invariant() {
        let fake = Arc::new(FakeSheet::new());
        let layout = ColumnLayout::default();
        fake.seed_row(&layout, 3, "a", true, true, Some("Red"));
        fake.seed_row(&layout, 4, "b", false, true, None);
        fake.seed_row(&layout, 5, "a", true, false, None);
        let sheet = roster_sheet(fake.clone());

        let entries = sheet
            .fetch_entries(&config(EventMode::Paired))
            .await
            .expect("fetch entries");
        assert_eq!(entries.len(), 2);
        let a = entries.get("a").expect("entry a");
        assert_eq!(a.store_row, 3);
        assert!(a.registered && a.checked_in);
        assert_eq!(a.team.as_deref(), Some("Red"));
        let b = entries.get("b").expect("entry b");
        assert!(!b.checked_in, "check-in without registration is dropped");
    }

    #[tokio::test]
    async fn individual_mode_ignores_team_column() {
        let fake = Arc::new(FakeSheet::new());
        fake.seed_row(&ColumnLayout::default(), 3, "a", true, false, Some("Red"));
        let entries = roster_sheet(fake)
            .fetch_entries(&config(EventMode::Individual))
            .await
            .expect("fetch entries");
        assert_eq!(entries.get("a").and_then(|e| e.team.clone()), None);
    }

    #[tokio::test]
    async fn stale_row_hint_triggers_rescan() {
        let fake = Arc::new(FakeSheet::new());
        let layout = ColumnLayout::default();
        fake.seed_row(&layout, 3, "other", true, false, None);
        fake.seed_row(&layout, 6, "moved", true, false, None);
        let sheet = roster_sheet(fake.clone());

        let lookup = sheet
            .find_row(&config(EventMode::Individual), &Identity::new("moved"), Some(3))
            .await
            .expect("find row");
        assert_eq!(lookup, RowLookup::Found(6));
    }

    #[tokio::test]
    async fn write_flags_on_missing_identity_is_a_conflict() {
        let fake = Arc::new(FakeSheet::new());
        let sheet = roster_sheet(fake.clone());
        let err = sheet
            .write_flags(
                &config(EventMode::Individual),
                &Identity::new("ghost"),
                None,
                Some(false),
                Some(false),
            )
            .await
            .expect_err("missing identity");
        assert!(matches!(err, RosterError::Conflict { .. }));
        assert_eq!(fake.write_count(), 0);
    }

    #[tokio::test]
    async fn write_entry_claims_free_row_and_encodes_flags() {
        let fake = Arc::new(FakeSheet::new());
        let layout = ColumnLayout::default();
        fake.seed_row(&layout, 3, "a", true, false, None);
        let sheet = roster_sheet(fake.clone());
        let draft = RosterEntry {
            identity: Identity::new("new"),
            display_name: "Newcomer".to_string(),
            alternate_names: vec!["Alt".to_string()],
            pronouns: Some("they/them".to_string()),
            registered: true,
            checked_in: false,
            team: None,
            store_row: 0,
        };
        let written = sheet
            .write_entry(&config(EventMode::Individual), draft, None)
            .await
            .expect("write entry");
        assert_eq!(written.store_row, 4);
        assert_eq!(fake.cell(&layout.identity, 4), "new");
        assert_eq!(fake.cell(&layout.registered, 4), "TRUE");
        assert_eq!(fake.cell(&layout.checked_in, 4), "FALSE");
        assert_eq!(fake.cell(&layout.pronouns, 4), "they/them");
    }
}
