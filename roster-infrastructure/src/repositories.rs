pub mod waitlist_files;

pub use waitlist_files::*;
