use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use roster_application::commands::waitlist_commands;
use roster_application::queries::waitlist_queries;
use roster_application::AppState;
use roster_domain::{ClearOutcome, WaitlistPosition, WaitlistView};

use crate::error::HttpError;
use crate::handlers::detached;
use crate::middleware::authorize;

pub async fn list_waitlist(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WaitlistView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let view = waitlist_queries::list_waitlist(&state, &guild).await?;
    Ok(Json(view))
}

pub async fn waitlist_position(
    State(state): State<AppState>,
    Path((guild, identity)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<WaitlistPosition>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let position = waitlist_queries::waitlist_position_of(&state, &guild, &identity).await?;
    Ok(Json(position))
}

pub async fn remove_from_waitlist(
    State(state): State<AppState>,
    Path((guild, identity)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let lookup = identity.clone();
    let removed = detached(async move {
        waitlist_commands::remove_from_waitlist(&state, &guild, &lookup).await
    })
    .await?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HttpError::NotFound(format!("'{}' is not waitlisted", identity)))
    }
}

pub async fn clear_waitlist(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ClearOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let outcome =
        detached(async move { waitlist_commands::clear_waitlist(&state, &guild).await }).await?;
    Ok(Json(outcome))
}
