use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use roster_domain::{
    BackoffPolicy, ColumnLayout, EventMode, GuildDefinition, GuildEventConfig, GuildId,
    RuntimeConfig, SheetBinding,
};

use crate::config::validation::{validate_column_layout, validate_guild_id};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub data_dir: String,
    pub log_dir: Option<String>,
    pub sheets_base_url: String,
    pub sheets_access_token: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub refresh_interval_seconds: u64,
    pub cache_ttl_seconds: u64,
    pub max_promotion_rounds: u32,
    pub backoff: BackoffPolicy,
    pub guilds: Vec<GuildConfigFile>,
}

/// One `[[guilds]]` table.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GuildConfigFile {
    pub id: String,
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub mode: String,
    pub max_entrants: u32,
    pub max_per_team: u32,
    pub header_row_offset: u32,
    pub columns: ColumnLayout,
}

impl Default for GuildConfigFile {
    fn default() -> Self {
        let event = GuildEventConfig::default();
        let sheet = SheetBinding::default();
        Self {
            id: String::new(),
            spreadsheet_id: sheet.spreadsheet_id,
            worksheet: sheet.worksheet,
            mode: event.mode.as_str().to_string(),
            max_entrants: event.max_entrants,
            max_per_team: event.max_per_team,
            header_row_offset: event.header_row_offset,
            columns: sheet.columns,
        }
    }
}

impl GuildConfigFile {
    fn to_definition(&self) -> GuildDefinition {
        GuildDefinition {
            id: GuildId::new(&self.id),
            event: GuildEventConfig {
                mode: EventMode::from(self.mode.as_str()),
                max_entrants: self.max_entrants,
                max_per_team: self.max_per_team,
                header_row_offset: self.header_row_offset,
            },
            sheet: SheetBinding {
                spreadsheet_id: self.spreadsheet_id.trim().to_string(),
                worksheet: self.worksheet.trim().to_string(),
                columns: self.columns.clone(),
            },
        }
    }
}

/// Connection settings for the Sheets HTTP client.
#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub base_url: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            bind_addr: runtime.bind_addr,
            api_token: None,
            data_dir: runtime.data_dir,
            log_dir: None,
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            sheets_access_token: None,
            max_body_bytes: runtime.max_body_bytes,
            request_timeout_seconds: runtime.request_timeout_seconds,
            refresh_interval_seconds: runtime.refresh_interval_seconds,
            cache_ttl_seconds: runtime.cache_ttl_seconds,
            max_promotion_rounds: runtime.max_promotion_rounds,
            backoff: BackoffPolicy::default(),
            guilds: Vec::new(),
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("ROSTER_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(Path::new(&path)).await
    }

    pub async fn load_from(file_path: &Path) -> Result<Self> {
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            warn!("{} not found, using defaults", file_path.display());
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.api_token = non_blank(self.api_token.take());
        self.sheets_access_token = non_blank(self.sheets_access_token.take());
        self.log_dir = non_blank(self.log_dir.take());
        self.sheets_base_url = self.sheets_base_url.trim().trim_end_matches('/').to_string();
        for guild in &mut self.guilds {
            guild.id = guild.id.trim().to_string();
            guild.columns.identity = guild.columns.identity.trim().to_uppercase();
            guild.columns.display_name = guild.columns.display_name.trim().to_uppercase();
            guild.columns.registered = guild.columns.registered.trim().to_uppercase();
            guild.columns.checked_in = guild.columns.checked_in.trim().to_uppercase();
            guild.columns.alternate_names = guild.columns.alternate_names.trim().to_uppercase();
            guild.columns.pronouns = guild.columns.pronouns.trim().to_uppercase();
            guild.columns.team = non_blank(guild.columns.team.take()).map(|team| team.to_uppercase());
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.data_dir = resolve_path(base, &self.data_dir);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.data_dir.trim().is_empty() {
            return Err(anyhow!("data_dir must not be empty"));
        }
        if self.sheets_base_url.is_empty() {
            return Err(anyhow!("sheets_base_url must not be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow!("request_timeout_seconds must be greater than 0"));
        }
        if self.max_promotion_rounds == 0 {
            return Err(anyhow!("max_promotion_rounds must be greater than 0"));
        }
        if self.backoff.initial_delay_ms == 0 || self.backoff.max_delay_ms < self.backoff.initial_delay_ms {
            return Err(anyhow!("backoff delays are out of range"));
        }

        let mut seen = HashSet::new();
        for guild in &self.guilds {
            validate_guild_id(&guild.id)?;
            if !seen.insert(guild.id.as_str()) {
                return Err(anyhow!("guild '{}' is configured twice", guild.id));
            }
            if guild.spreadsheet_id.trim().is_empty() {
                return Err(anyhow!("guild '{}': spreadsheet_id must not be empty", guild.id));
            }
            if guild.worksheet.trim().is_empty() {
                return Err(anyhow!("guild '{}': worksheet must not be empty", guild.id));
            }
            if guild.max_entrants == 0 || guild.max_per_team == 0 {
                return Err(anyhow!("guild '{}': capacity limits must be at least 1", guild.id));
            }
            let paired = EventMode::from(guild.mode.as_str()) == EventMode::Paired;
            validate_column_layout(&guild.columns, paired)
                .map_err(|err| anyhow!("guild '{}': {}", guild.id, err))?;
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            data_dir: self.data_dir.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            refresh_interval_seconds: self.refresh_interval_seconds,
            cache_ttl_seconds: self.cache_ttl_seconds,
            max_promotion_rounds: self.max_promotion_rounds,
            backoff: self.backoff.clone(),
            guilds: self.guilds.iter().map(GuildConfigFile::to_definition).collect(),
        }
    }

    pub fn to_sheets_settings(&self) -> SheetsSettings {
        SheetsSettings {
            base_url: self.sheets_base_url.clone(),
            access_token: self.sheets_access_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("ROSTER_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("ROSTER_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("ROSTER_SHEETS_BASE_URL") {
            self.sheets_base_url = value;
        }
        if let Ok(value) = env::var("ROSTER_SHEETS_ACCESS_TOKEN") {
            self.sheets_access_token = Some(value);
        }
        if let Ok(value) = env::var("ROSTER_DATA_DIR") {
            self.data_dir = value;
        }
        if let Ok(value) = env::var("ROSTER_LOG_DIR") {
            self.log_dir = Some(value);
        }
        if let Ok(value) = env::var("ROSTER_REFRESH_INTERVAL_SECONDS") {
            self.refresh_interval_seconds = value.parse().unwrap_or(self.refresh_interval_seconds);
        }
        if let Ok(value) = env::var("ROSTER_CACHE_TTL_SECONDS") {
            self.cache_ttl_seconds = value.parse().unwrap_or(self.cache_ttl_seconds);
        }
        if let Ok(value) = env::var("ROSTER_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("ROSTER_MAX_PROMOTION_ROUNDS") {
            self.max_promotion_rounds = value.parse().unwrap_or(self.max_promotion_rounds);
        }
        if let Ok(value) = env::var("ROSTER_TRANSIENT_RETRY_LIMIT") {
            self.backoff.transient_retry_limit =
                value.parse().unwrap_or(self.backoff.transient_retry_limit);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}
