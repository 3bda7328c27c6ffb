pub mod event_hub;

pub use event_hub::RosterEventHub;
