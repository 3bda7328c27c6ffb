use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use roster_domain::ports::HealthCheckService;
use roster_domain::GuildId;

use crate::repositories::JsonWaitlistRepository;
use crate::services::SheetsHttpClient;

pub struct DefaultHealthService {
    waitlist_repo: Arc<JsonWaitlistRepository>,
    sheets: HashMap<GuildId, Arc<SheetsHttpClient>>,
}

impl DefaultHealthService {
    pub fn new(
        waitlist_repo: Arc<JsonWaitlistRepository>,
        sheets: HashMap<GuildId, Arc<SheetsHttpClient>>,
    ) -> Self {
        Self {
            waitlist_repo,
            sheets,
        }
    }
}

#[async_trait]
impl HealthCheckService for DefaultHealthService {
    async fn check_waitlist_storage(&self) -> anyhow::Result<bool> {
        self.waitlist_repo.probe().await.map(|_| true)
    }

    async fn check_sheet(&self, guild: &GuildId) -> anyhow::Result<bool> {
        let client = self
            .sheets
            .get(guild)
            .ok_or_else(|| anyhow!("no sheet client for guild '{}'", guild))?;
        client.check().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn storage_probe_and_unknown_guild() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = DefaultHealthService::new(
            Arc::new(JsonWaitlistRepository::new(dir.path())),
            HashMap::new(),
        );
        assert!(service.check_waitlist_storage().await.expect("probe"));
        assert!(service.check_sheet(&GuildId::new("missing")).await.is_err());
    }
}
