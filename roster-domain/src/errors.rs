// Domain error taxonomy

use thiserror::Error;

/// How a failed remote call should be treated by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimited,
    Transient,
    Rejected,
    Cancelled,
}

/// Errors surfaced by a `SheetClient` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("rate limited by remote store: {0}")]
    RateLimited(String),
    #[error("remote store unavailable: {0}")]
    Transient(String),
    #[error("remote store rejected request: {0}")]
    Rejected(String),
    #[error("remote call cancelled by shutdown")]
    Cancelled,
}

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::RateLimited(_) => ErrorClass::RateLimited,
            StoreError::Transient(_) => ErrorClass::Transient,
            StoreError::Rejected(_) => ErrorClass::Rejected,
            StoreError::Cancelled => ErrorClass::Cancelled,
        }
    }
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("waitlist persistence failed: {0}")]
    Persistence(String),
    #[error("roster row for '{identity}' is inconsistent: {detail}")]
    Conflict { identity: String, detail: String },
    #[error("unknown guild '{0}'")]
    UnknownGuild(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RosterError {
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        RosterError::Persistence(err.to_string())
    }
}

pub type RosterResult<T> = Result<T, RosterError>;
