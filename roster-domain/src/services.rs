// Pure domain services

pub mod backoff;
pub mod capacity;

pub use backoff::*;
pub use capacity::*;
