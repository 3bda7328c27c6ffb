pub mod health_service;
pub mod refresh_service;
pub mod sheets_client;

pub use health_service::*;
pub use refresh_service::*;
pub use sheets_client::*;
