// Roster Application Layer

pub mod admission;
pub mod cache;
pub mod commands;
pub mod error;
pub mod guild;
pub mod invoker;
pub mod metrics;
pub mod ops;
pub mod queries;
pub mod sheet;
pub mod shutdown;
pub mod state;
pub mod waitlist;

#[cfg(test)]
pub(crate) mod testing;

pub use admission::AdmissionEngine;
pub use cache::RosterCache;
pub use error::AppError;
pub use guild::GuildRoster;
pub use invoker::RetryingInvoker;
pub use metrics::Metrics;
pub use ops::RosterEventHub;
pub use sheet::RosterSheet;
pub use shutdown::{ShutdownController, ShutdownSignal};
pub use state::AppState;
pub use waitlist::WaitlistStore;
