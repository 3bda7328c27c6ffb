// Domain entities

pub mod change_set;
pub mod guild_config;
pub mod model;
pub mod roster_entry;
pub mod roster_event;
pub mod roster_snapshot;
pub mod runtime_config;
pub mod waitlist_entry;

pub use change_set::*;
pub use guild_config::*;
pub use model::*;
pub use roster_entry::*;
pub use roster_event::*;
pub use roster_snapshot::*;
pub use runtime_config::*;
pub use waitlist_entry::*;
