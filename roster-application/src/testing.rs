//! In-memory doubles shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use roster_domain::{
    encode_flag, BackoffPolicy, CellRef, CellUpdate, ColumnLayout, GuildDefinition,
    GuildEventConfig, GuildId, HealthCheckService, Identity, RegistrationProfile, RuntimeConfig,
    SheetBinding, SheetClient, StoreError, WaitlistEntry, WaitlistRepository,
};

use crate::{AppState, GuildRoster, Metrics, RetryingInvoker, ShutdownSignal};

/// Pauses the next matching sheet call until `release` is notified.
#[derive(Clone, Default)]
pub(crate) struct Gate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Gate {
    async fn pass(slot: &Mutex<Option<Gate>>) {
        let gate = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeSheet {
    cells: Mutex<HashMap<(String, u32), String>>,
    read_failures: Mutex<VecDeque<StoreError>>,
    write_failures: Mutex<VecDeque<StoreError>>,
    read_gate: Mutex<Option<Gate>>,
    write_gate: Mutex<Option<Gate>>,
    column_gate: Mutex<Option<(String, Gate)>>,
    writes: AtomicUsize,
}

impl FakeSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, column: &str, row: u32, value: &str) {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((column.to_uppercase(), row), value.to_string());
    }

    pub fn cell(&self, column: &str, row: u32) -> String {
        self.cells
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(column.to_uppercase(), row))
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed_row(
        &self,
        layout: &ColumnLayout,
        row: u32,
        identity: &str,
        registered: bool,
        checked_in: bool,
        team: Option<&str>,
    ) {
        self.set(&layout.identity, row, identity);
        self.set(&layout.display_name, row, &identity.to_uppercase());
        self.set(&layout.registered, row, encode_flag(registered));
        self.set(&layout.checked_in, row, encode_flag(checked_in));
        if let (Some(column), Some(team)) = (&layout.team, team) {
            self.set(column, row, team);
        }
    }

    pub fn fail_next_read(&self, err: StoreError) {
        self.read_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(err);
    }

    pub fn fail_next_write(&self, err: StoreError) {
        self.write_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(err);
    }

    pub fn pause_reads(&self) -> Gate {
        let gate = Gate::default();
        *self.read_gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(gate.clone());
        gate
    }

    pub fn pause_writes(&self) -> Gate {
        let gate = Gate::default();
        *self.write_gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(gate.clone());
        gate
    }

    /// Holds the next read of `column` after its values were captured, so
    /// the caller sees the sheet as it was before any write made meanwhile.
    pub fn pause_after_read(&self, column: &str) -> Gate {
        let gate = Gate::default();
        *self.column_gate.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((column.to_uppercase(), gate.clone()));
        gate
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn before_read(&self) -> Result<(), StoreError> {
        Gate::pass(&self.read_gate).await;
        let failure = self
            .read_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        failure.map_or(Ok(()), Err)
    }

    async fn before_write(&self) -> Result<(), StoreError> {
        Gate::pass(&self.write_gate).await;
        let failure = self
            .write_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl SheetClient for FakeSheet {
    async fn get_cell(&self, cell: &CellRef) -> Result<String, StoreError> {
        self.before_read().await?;
        Ok(self.cell(&cell.column, cell.row))
    }

    async fn get_column(&self, column: &str) -> Result<Vec<String>, StoreError> {
        self.before_read().await?;
        let column = column.to_uppercase();
        let values = {
            let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
            let last_row = cells
                .iter()
                .filter(|((col, _), value)| *col == column && !value.is_empty())
                .map(|((_, row), _)| *row)
                .max()
                .unwrap_or(0);
            (1..=last_row)
                .map(|row| cells.get(&(column.clone(), row)).cloned().unwrap_or_default())
                .collect::<Vec<_>>()
        };
        let gate = {
            let mut slot = self.column_gate.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.take() {
                Some((gated, gate)) if gated == column => Some(gate),
                other => {
                    *slot = other;
                    None
                }
            }
        };
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        Ok(values)
    }

    async fn set_cell(&self, cell: &CellRef, value: &str) -> Result<(), StoreError> {
        self.before_write().await?;
        self.set(&cell.column, cell.row, value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_cells(&self, updates: &[CellUpdate]) -> Result<(), StoreError> {
        self.before_write().await?;
        for update in updates {
            self.set(&update.cell.column, update.cell.row, &update.value);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryWaitlistRepository {
    queues: Mutex<HashMap<GuildId, Vec<WaitlistEntry>>>,
    fail_next_save: AtomicBool,
}

impl MemoryWaitlistRepository {
    pub fn seed(&self, guild: &GuildId, entries: Vec<WaitlistEntry>) {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(guild.clone(), entries);
    }

    pub fn stored(&self, guild: &GuildId) -> Vec<WaitlistEntry> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(guild)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl WaitlistRepository for MemoryWaitlistRepository {
    async fn load_all(&self, guild: &GuildId) -> anyhow::Result<Vec<WaitlistEntry>> {
        Ok(self.stored(guild))
    }

    async fn save_all(&self, guild: &GuildId, entries: &[WaitlistEntry]) -> anyhow::Result<()> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.seed(guild, entries.to_vec());
        Ok(())
    }
}

pub(crate) struct StubHealthService;

#[async_trait]
impl HealthCheckService for StubHealthService {
    async fn check_waitlist_storage(&self) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn check_sheet(&self, _guild: &GuildId) -> anyhow::Result<bool> {
        Ok(true)
    }
}

pub(crate) fn test_invoker() -> Arc<RetryingInvoker> {
    Arc::new(RetryingInvoker::new(
        BackoffPolicy::default(),
        ShutdownSignal::never(),
        Arc::new(Metrics::default()),
    ))
}

pub(crate) fn profile(name: &str) -> RegistrationProfile {
    RegistrationProfile {
        display_name: name.to_uppercase(),
        ..RegistrationProfile::default()
    }
}

pub(crate) fn waitlist_entry(identity: &str, team: Option<&str>) -> WaitlistEntry {
    WaitlistEntry::new(
        Identity::new(identity),
        format!("member-{identity}"),
        profile(identity),
        team.map(ToString::to_string),
        Utc::now(),
    )
}

/// One guild wired to fakes through the real [`AppState`] constructor.
pub(crate) struct TestContext {
    pub state: AppState,
    pub sheet: Arc<FakeSheet>,
    pub repo: Arc<MemoryWaitlistRepository>,
    pub guild: GuildId,
    pub layout: ColumnLayout,
}

impl TestContext {
    pub fn new(event: GuildEventConfig) -> Self {
        let guild = GuildId::new("g1");
        let layout = ColumnLayout::default();
        let config = RuntimeConfig {
            guilds: vec![GuildDefinition {
                id: guild.clone(),
                event,
                sheet: SheetBinding {
                    spreadsheet_id: "sheet-1".to_string(),
                    worksheet: "Roster".to_string(),
                    columns: layout.clone(),
                },
            }],
            ..RuntimeConfig::default()
        };
        let sheet = Arc::new(FakeSheet::new());
        let repo = Arc::new(MemoryWaitlistRepository::default());
        let mut sheets: HashMap<GuildId, Arc<dyn SheetClient>> = HashMap::new();
        sheets.insert(guild.clone(), sheet.clone());
        let state = AppState::new(
            config,
            sheets,
            repo.clone(),
            Arc::new(StubHealthService),
            ShutdownSignal::never(),
        )
        .expect("build app state");
        Self {
            state,
            sheet,
            repo,
            guild,
            layout,
        }
    }

    pub fn roster(&self) -> Arc<GuildRoster> {
        self.state.guild(self.guild.as_str()).expect("test guild")
    }

    pub fn seed(&self, row: u32, identity: &str, registered: bool, checked_in: bool, team: Option<&str>) {
        self.sheet
            .seed_row(&self.layout, row, identity, registered, checked_in, team);
    }

    pub fn cell(&self, column: &str, row: u32) -> String {
        self.sheet.cell(column, row)
    }

    pub async fn refresh(&self) {
        self.roster().refresh().await.expect("refresh roster");
    }

    pub async fn enqueue(&self, entries: Vec<WaitlistEntry>) {
        for entry in entries {
            self.state
                .waitlist
                .append(&self.guild, entry)
                .await
                .expect("enqueue");
        }
    }

    pub async fn waitlist(&self) -> Vec<WaitlistEntry> {
        self.state
            .waitlist
            .list_in_order(&self.guild)
            .await
            .expect("list waitlist")
    }
}
