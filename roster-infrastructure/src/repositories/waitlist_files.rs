use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use roster_domain::{GuildId, WaitlistEntry, WaitlistRepository};

const FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct WaitlistFile {
    version: u32,
    guild: GuildId,
    entries: Vec<WaitlistEntry>,
}

/// Stores each guild's waitlist as `<data_dir>/waitlist/<guild>.json`.
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write never leaves a truncated queue behind.
pub struct JsonWaitlistRepository {
    dir: PathBuf,
}

impl JsonWaitlistRepository {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join("waitlist"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, guild: &GuildId) -> PathBuf {
        self.dir.join(format!("{}.json", guild.as_str()))
    }

    /// Creates the storage directory and checks it is writable.
    pub async fn probe(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let marker = self.dir.join(".probe");
        fs::write(&marker, b"ok").await?;
        fs::remove_file(&marker).await?;
        Ok(())
    }
}

#[async_trait]
impl WaitlistRepository for JsonWaitlistRepository {
    async fn load_all(&self, guild: &GuildId) -> anyhow::Result<Vec<WaitlistEntry>> {
        let path = self.path_for(guild);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let file: WaitlistFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(file.entries)
    }

    async fn save_all(&self, guild: &GuildId, entries: &[WaitlistEntry]) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(guild);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&WaitlistFile {
            version: FILE_VERSION,
            guild: guild.clone(),
            entries: entries.to_vec(),
        })?;
        fs::write(&tmp, content)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}
