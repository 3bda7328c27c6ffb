use async_trait::async_trait;

use crate::errors::StoreError;
use crate::value_objects::{CellRef, CellUpdate, GuildId};

/// Cell-addressed access to one worksheet of the remote store.
#[async_trait]
pub trait SheetClient: Send + Sync {
    async fn get_cell(&self, cell: &CellRef) -> Result<String, StoreError>;
    /// Full column starting at row 1. Trailing blank cells may be omitted.
    async fn get_column(&self, column: &str) -> Result<Vec<String>, StoreError>;
    async fn set_cell(&self, cell: &CellRef, value: &str) -> Result<(), StoreError>;
    async fn set_cells(&self, updates: &[CellUpdate]) -> Result<(), StoreError>;
}

#[async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn check_waitlist_storage(&self) -> anyhow::Result<bool>;
    async fn check_sheet(&self, guild: &GuildId) -> anyhow::Result<bool>;
}
