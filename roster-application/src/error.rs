use roster_domain::{RosterError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("temporarily unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RosterError> for AppError {
    fn from(value: RosterError) -> Self {
        match value {
            RosterError::UnknownGuild(guild) => AppError::NotFound(format!("guild '{}'", guild)),
            RosterError::InvalidInput(msg) => AppError::BadRequest(msg),
            RosterError::Store(StoreError::Rejected(msg)) => {
                AppError::Internal(anyhow::anyhow!("remote store rejected request: {}", msg))
            }
            RosterError::Store(err) => AppError::Unavailable(err.to_string()),
            err @ RosterError::Persistence(_) => AppError::Unavailable(err.to_string()),
            err @ RosterError::Conflict { .. } => AppError::Unavailable(err.to_string()),
        }
    }
}
