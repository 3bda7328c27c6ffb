// Runtime configuration handed from infrastructure to the application layer

use serde::{Deserialize, Serialize};

use crate::entities::GuildDefinition;
use crate::services::BackoffPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub data_dir: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub refresh_interval_seconds: u64,
    pub cache_ttl_seconds: u64,
    pub max_promotion_rounds: u32,
    pub backoff: BackoffPolicy,
    pub guilds: Vec<GuildDefinition>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            data_dir: "./data".to_string(),
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
            refresh_interval_seconds: 300,
            cache_ttl_seconds: 900,
            max_promotion_rounds: 50,
            backoff: BackoffPolicy::default(),
            guilds: Vec::new(),
        }
    }
}
