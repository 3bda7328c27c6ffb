pub mod event_handlers;
pub mod ops_handlers;
pub mod roster_handlers;
pub mod waitlist_handlers;

pub use event_handlers::*;
pub use ops_handlers::*;
pub use roster_handlers::*;
pub use waitlist_handlers::*;

use std::future::Future;

use roster_application::AppError;

use crate::error::HttpError;

/// Runs a command on its own task so a client disconnect or request
/// timeout cannot drop it between a remote write and the cache update.
pub(crate) async fn detached<T, F>(work: F) -> Result<T, HttpError>
where
    F: Future<Output = Result<T, AppError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|err| HttpError::Internal(format!("command task failed: {}", err)))?
        .map_err(HttpError::from)
}
