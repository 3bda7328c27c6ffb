pub mod health_queries;
pub mod roster_queries;
pub mod waitlist_queries;
