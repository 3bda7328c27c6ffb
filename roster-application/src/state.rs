use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use roster_domain::ports::{HealthCheckService, SheetClient, WaitlistRepository};
use roster_domain::{GuildId, RosterError, RosterResult, RuntimeConfig};

use crate::{
    AdmissionEngine, GuildRoster, Metrics, RetryingInvoker, RosterEventHub, RosterSheet,
    ShutdownSignal, WaitlistStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub guilds: Arc<HashMap<GuildId, Arc<GuildRoster>>>,
    pub waitlist: Arc<WaitlistStore>,
    pub admission: Arc<AdmissionEngine>,
    pub events: Arc<RosterEventHub>,
    pub invoker: Arc<RetryingInvoker>,
    pub metrics: Arc<Metrics>,
    pub health_service: Arc<dyn HealthCheckService>,
}

impl AppState {
    /// Wires one [`GuildRoster`] per configured guild. Every guild needs a
    /// sheet client in `sheets`.
    pub fn new(
        config: RuntimeConfig,
        sheets: HashMap<GuildId, Arc<dyn SheetClient>>,
        waitlist_repo: Arc<dyn WaitlistRepository>,
        health_service: Arc<dyn HealthCheckService>,
        shutdown: ShutdownSignal,
    ) -> RosterResult<Self> {
        let metrics = Arc::new(Metrics::default());
        let invoker = Arc::new(RetryingInvoker::new(
            config.backoff.clone(),
            shutdown,
            metrics.clone(),
        ));

        let mut guilds = HashMap::new();
        for definition in &config.guilds {
            let client = sheets.get(&definition.id).cloned().ok_or_else(|| {
                RosterError::InvalidInput(format!("no sheet client for guild '{}'", definition.id))
            })?;
            let sheet = RosterSheet::new(
                client,
                invoker.clone(),
                definition.sheet.columns.clone(),
                metrics.clone(),
            );
            let roster = GuildRoster::new(
                definition.id.clone(),
                definition.event.clone(),
                sheet,
                metrics.clone(),
            );
            guilds.insert(definition.id.clone(), Arc::new(roster));
        }

        let waitlist = Arc::new(WaitlistStore::new(waitlist_repo));
        let events = Arc::new(RosterEventHub::default());
        let admission = Arc::new(AdmissionEngine::new(
            waitlist.clone(),
            events.clone(),
            metrics.clone(),
            config.max_promotion_rounds,
        ));

        Ok(Self {
            config,
            guilds: Arc::new(guilds),
            waitlist,
            admission,
            events,
            invoker,
            metrics,
            health_service,
        })
    }

    pub fn guild(&self, id: &str) -> RosterResult<Arc<GuildRoster>> {
        self.guilds
            .get(&GuildId::new(id))
            .cloned()
            .ok_or_else(|| RosterError::UnknownGuild(id.trim().to_string()))
    }

    pub fn guild_ids(&self) -> Vec<GuildId> {
        let mut ids = self.guilds.keys().cloned().collect::<Vec<_>>();
        ids.sort();
        ids
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl_seconds)
    }
}
