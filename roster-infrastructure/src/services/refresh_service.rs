use std::time::Duration;

use tracing::{debug, info};

use roster_application::commands::refresh_commands::refresh_all;
use roster_application::{AppState, ShutdownSignal};

/// Periodically re-reads every guild's sheet so edits made directly in the
/// spreadsheet reach the cache. An interval of zero disables the loop.
pub async fn schedule_refreshes(state: AppState, shutdown: ShutdownSignal) {
    let interval = state.config.refresh_interval_seconds;
    if interval == 0 {
        info!("periodic roster refresh disabled");
        return;
    }
    let period = Duration::from_secs(interval);
    loop {
        let refreshed = refresh_all(&state).await;
        debug!(refreshed, total = state.guilds.len(), "periodic roster refresh");

        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = shutdown.cancelled() => {
                info!("roster refresh loop stopped");
                return;
            }
        }
    }
}
