use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use roster_application::commands::{
    capacity_commands, check_in_commands, refresh_commands, registration_commands, reset_commands,
};
use roster_application::queries::roster_queries;
use roster_application::AppState;
use roster_domain::{
    CapacityOutcome, CapacityUpdate, CheckInOutcome, RefreshOutcome, RegistrationOutcome,
    RegistrationRequest, ResetSummary, RosterEntry, RosterView, UnregisterOutcome,
};

use crate::error::HttpError;
use crate::handlers::detached;
use crate::middleware::authorize;

#[derive(Debug, Deserialize)]
pub struct IdentityBody {
    pub identity: String,
}

#[derive(Debug, Serialize)]
pub struct CheckInResetResponse {
    pub reset: usize,
}

pub async fn register(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<RegistrationRequest>,
) -> Result<Json<RegistrationOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let outcome =
        detached(async move { registration_commands::register(&state, &guild, payload).await })
            .await?;
    Ok(Json(outcome))
}

pub async fn unregister(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<IdentityBody>,
) -> Result<Json<UnregisterOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let outcome = detached(async move {
        registration_commands::unregister(&state, &guild, &payload.identity).await
    })
    .await?;
    Ok(Json(outcome))
}

pub async fn check_in(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<IdentityBody>,
) -> Result<Json<CheckInOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let outcome = detached(async move {
        check_in_commands::check_in(&state, &guild, &payload.identity).await
    })
    .await?;
    Ok(Json(outcome))
}

pub async fn check_out(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<IdentityBody>,
) -> Result<Json<CheckInOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let outcome = detached(async move {
        check_in_commands::check_out(&state, &guild, &payload.identity).await
    })
    .await?;
    Ok(Json(outcome))
}

pub async fn force_refresh(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RefreshOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let outcome =
        detached(async move { refresh_commands::force_refresh(&state, &guild).await }).await?;
    Ok(Json(outcome))
}

pub async fn reset_all(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ResetSummary>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let summary = detached(async move { reset_commands::reset_all(&state, &guild).await }).await?;
    Ok(Json(summary))
}

pub async fn reset_check_ins(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CheckInResetResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let reset =
        detached(async move { reset_commands::reset_check_ins(&state, &guild).await }).await?;
    Ok(Json(CheckInResetResponse { reset }))
}

pub async fn update_capacity(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<CapacityUpdate>,
) -> Result<Json<CapacityOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let outcome = detached(async move {
        capacity_commands::update_capacity(&state, &guild, payload).await
    })
    .await?;
    Ok(Json(outcome))
}

pub async fn list_roster(
    State(state): State<AppState>,
    Path(guild): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RosterView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let view = roster_queries::list_roster(&state, &guild).await?;
    Ok(Json(view))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path((guild, identity)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<RosterEntry>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    roster_queries::get_entry(&state, &guild, &identity)
        .await?
        .map(Json)
        .ok_or_else(|| HttpError::NotFound(format!("'{}' is not on the roster", identity)))
}
