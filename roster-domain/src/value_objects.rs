// Domain value objects
pub mod cell;
pub mod identifiers;

pub use cell::*;
pub use identifiers::*;
