use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use roster_application::{AppState, ShutdownController};
use roster_domain::ports::SheetClient;
use roster_domain::GuildId;
use roster_infrastructure::{
    AppConfig, DefaultHealthService, JsonWaitlistRepository, SheetsHttpClient,
};

pub struct AppContext {
    pub state: AppState,
    pub shutdown: ShutdownController,
}

impl AppContext {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let settings = config.to_sheets_settings();

        let mut sheets: HashMap<GuildId, Arc<dyn SheetClient>> = HashMap::new();
        let mut probes = HashMap::new();
        for guild in &runtime_config.guilds {
            let client = Arc::new(SheetsHttpClient::new(&settings, &guild.sheet)?);
            probes.insert(guild.id.clone(), client.clone());
            sheets.insert(guild.id.clone(), client);
            info!(
                guild = %guild.id,
                mode = guild.event.mode.as_str(),
                max_entrants = guild.event.max_entrants,
                "guild configured"
            );
        }

        let waitlist_repo = Arc::new(JsonWaitlistRepository::new(&runtime_config.data_dir));
        let health_service = Arc::new(DefaultHealthService::new(waitlist_repo.clone(), probes));
        let shutdown = ShutdownController::new();
        let state = AppState::new(
            runtime_config,
            sheets,
            waitlist_repo,
            health_service,
            shutdown.signal(),
        )?;

        Ok(Self { state, shutdown })
    }
}
