use axum::routing::{get, post, put};
use axum::Router;

use roster_application::AppState;

use crate::handlers::{event_handlers, ops_handlers, roster_handlers, waitlist_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/guilds", get(ops_handlers::list_guilds))
        .route(
            "/v1/guilds/:guild/register",
            post(roster_handlers::register),
        )
        .route(
            "/v1/guilds/:guild/unregister",
            post(roster_handlers::unregister),
        )
        .route(
            "/v1/guilds/:guild/check-in",
            post(roster_handlers::check_in),
        )
        .route(
            "/v1/guilds/:guild/check-out",
            post(roster_handlers::check_out),
        )
        .route(
            "/v1/guilds/:guild/refresh",
            post(roster_handlers::force_refresh),
        )
        .route("/v1/guilds/:guild/reset", post(roster_handlers::reset_all))
        .route(
            "/v1/guilds/:guild/reset-check-ins",
            post(roster_handlers::reset_check_ins),
        )
        .route(
            "/v1/guilds/:guild/capacity",
            put(roster_handlers::update_capacity),
        )
        .route("/v1/guilds/:guild/roster", get(roster_handlers::list_roster))
        .route(
            "/v1/guilds/:guild/roster/:identity",
            get(roster_handlers::get_entry),
        )
        .route(
            "/v1/guilds/:guild/waitlist",
            get(waitlist_handlers::list_waitlist).delete(waitlist_handlers::clear_waitlist),
        )
        .route(
            "/v1/guilds/:guild/waitlist/:identity",
            get(waitlist_handlers::waitlist_position)
                .delete(waitlist_handlers::remove_from_waitlist),
        )
        .route(
            "/v1/guilds/:guild/events",
            get(event_handlers::stream_events),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use roster_application::ShutdownSignal;
    use roster_domain::ports::{HealthCheckService, SheetClient, WaitlistRepository};
    use roster_domain::{
        CellRef, CellUpdate, GuildDefinition, GuildEventConfig, GuildId, RuntimeConfig,
        SheetBinding, StoreError, WaitlistEntry,
    };

    #[derive(Default)]
    struct MemorySheet {
        cells: Mutex<HashMap<CellRef, String>>,
    }

    #[async_trait]
    impl SheetClient for MemorySheet {
        async fn get_cell(&self, cell: &CellRef) -> Result<String, StoreError> {
            Ok(self.cells.lock().expect("cells").get(cell).cloned().unwrap_or_default())
        }

        async fn get_column(&self, column: &str) -> Result<Vec<String>, StoreError> {
            let cells = self.cells.lock().expect("cells");
            let last = cells
                .keys()
                .filter(|cell| cell.column == column)
                .map(|cell| cell.row)
                .max()
                .unwrap_or(0);
            Ok((1..=last)
                .map(|row| cells.get(&CellRef::new(column, row)).cloned().unwrap_or_default())
                .collect())
        }

        async fn set_cell(&self, cell: &CellRef, value: &str) -> Result<(), StoreError> {
            self.cells
                .lock()
                .expect("cells")
                .insert(cell.clone(), value.to_string());
            Ok(())
        }

        async fn set_cells(&self, updates: &[CellUpdate]) -> Result<(), StoreError> {
            let mut cells = self.cells.lock().expect("cells");
            for update in updates {
                cells.insert(update.cell.clone(), update.value.clone());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryWaitlist {
        queues: Mutex<HashMap<GuildId, Vec<WaitlistEntry>>>,
    }

    #[async_trait]
    impl WaitlistRepository for MemoryWaitlist {
        async fn load_all(&self, guild: &GuildId) -> anyhow::Result<Vec<WaitlistEntry>> {
            Ok(self.queues.lock().expect("queues").get(guild).cloned().unwrap_or_default())
        }

        async fn save_all(&self, guild: &GuildId, entries: &[WaitlistEntry]) -> anyhow::Result<()> {
            self.queues
                .lock()
                .expect("queues")
                .insert(guild.clone(), entries.to_vec());
            Ok(())
        }
    }

    struct AlwaysHealthy;

    #[async_trait]
    impl HealthCheckService for AlwaysHealthy {
        async fn check_waitlist_storage(&self) -> anyhow::Result<bool> {
            Ok(true)
        }

        async fn check_sheet(&self, _guild: &GuildId) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    async fn spawn_app() -> String {
        let guild = GuildId::new("g1");
        let config = RuntimeConfig {
            api_token: Some("secret".to_string()),
            guilds: vec![GuildDefinition {
                id: guild.clone(),
                event: GuildEventConfig {
                    max_entrants: 1,
                    ..GuildEventConfig::default()
                },
                sheet: SheetBinding::default(),
            }],
            ..RuntimeConfig::default()
        };
        let mut sheets: HashMap<GuildId, Arc<dyn SheetClient>> = HashMap::new();
        sheets.insert(guild, Arc::new(MemorySheet::default()));
        let state = AppState::new(
            config,
            sheets,
            Arc::new(MemoryWaitlist::default()),
            Arc::new(AlwaysHealthy),
            ShutdownSignal::never(),
        )
        .expect("state");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, build_router(state)).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn registration_flow_over_http() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let unauthorized = client
            .get(format!("{base}/v1/guilds/g1/roster"))
            .send()
            .await
            .expect("request");
        assert_eq!(unauthorized.status(), 401);

        let first: Value = client
            .post(format!("{base}/v1/guilds/g1/register"))
            .bearer_auth("secret")
            .json(&json!({ "identity": "p1", "display_name": "Player One" }))
            .send()
            .await
            .expect("register p1")
            .json()
            .await
            .expect("json");
        assert_eq!(first["outcome"], "registered");

        let second: Value = client
            .post(format!("{base}/v1/guilds/g1/register"))
            .bearer_auth("secret")
            .json(&json!({ "identity": "p2", "display_name": "Player Two" }))
            .send()
            .await
            .expect("register p2")
            .json()
            .await
            .expect("json");
        assert_eq!(second["outcome"], "waitlisted");
        assert_eq!(second["position"], 1);

        let roster: Value = client
            .get(format!("{base}/v1/guilds/g1/roster"))
            .bearer_auth("secret")
            .send()
            .await
            .expect("roster")
            .json()
            .await
            .expect("json");
        assert_eq!(roster["registered"], 1);
        assert_eq!(roster["waitlisted"], 1);

        let position: Value = client
            .get(format!("{base}/v1/guilds/g1/waitlist/p2"))
            .bearer_auth("secret")
            .send()
            .await
            .expect("position")
            .json()
            .await
            .expect("json");
        assert_eq!(position["position"], 1);
    }

    #[tokio::test]
    async fn unknown_guild_and_identity_are_not_found() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let guild = client
            .get(format!("{base}/v1/guilds/nope/roster"))
            .bearer_auth("secret")
            .send()
            .await
            .expect("request");
        assert_eq!(guild.status(), 404);

        let removed = client
            .delete(format!("{base}/v1/guilds/g1/waitlist/ghost"))
            .bearer_auth("secret")
            .send()
            .await
            .expect("request");
        assert_eq!(removed.status(), 404);

        let live = client
            .get(format!("{base}/v1/ops/health/live"))
            .send()
            .await
            .expect("request");
        assert_eq!(live.status(), 200);
    }
}
