// Per-guild event configuration and sheet binding

use serde::{Deserialize, Serialize};

use crate::value_objects::GuildId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventMode {
    #[default]
    Individual,
    Paired,
}

impl EventMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventMode::Individual => "individual",
            EventMode::Paired => "paired",
        }
    }
}

impl From<&str> for EventMode {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "paired" | "doubleup" | "double_up" | "teams" => EventMode::Paired,
            _ => EventMode::Individual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildEventConfig {
    pub mode: EventMode,
    pub max_entrants: u32,
    pub max_per_team: u32,
    pub header_row_offset: u32,
}

impl Default for GuildEventConfig {
    fn default() -> Self {
        Self {
            mode: EventMode::Individual,
            max_entrants: 32,
            max_per_team: 2,
            header_row_offset: 2,
        }
    }
}

impl GuildEventConfig {
    pub fn is_paired(&self) -> bool {
        self.mode == EventMode::Paired
    }

    pub fn first_data_row(&self) -> u32 {
        self.header_row_offset + 1
    }

    /// Maps a zero-based data index onto its sheet row.
    pub fn store_row(&self, index: usize) -> u32 {
        self.first_data_row() + index as u32
    }
}

/// Column letters for the logical row layout. The letters come from the
/// column-mapping collaborator; this crate only consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub identity: String,
    pub display_name: String,
    pub registered: String,
    pub checked_in: String,
    pub team: Option<String>,
    pub alternate_names: String,
    pub pronouns: String,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            identity: "B".to_string(),
            display_name: "C".to_string(),
            registered: "D".to_string(),
            checked_in: "E".to_string(),
            team: Some("F".to_string()),
            alternate_names: "G".to_string(),
            pronouns: "H".to_string(),
        }
    }
}

impl ColumnLayout {
    pub fn all(&self) -> Vec<&str> {
        let mut columns = vec![
            self.identity.as_str(),
            self.display_name.as_str(),
            self.registered.as_str(),
            self.checked_in.as_str(),
            self.alternate_names.as_str(),
            self.pronouns.as_str(),
        ];
        if let Some(team) = &self.team {
            columns.push(team.as_str());
        }
        columns
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetBinding {
    pub spreadsheet_id: String,
    pub worksheet: String,
    pub columns: ColumnLayout,
}

impl Default for SheetBinding {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            worksheet: "Roster".to_string(),
            columns: ColumnLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildDefinition {
    pub id: GuildId,
    pub event: GuildEventConfig,
    pub sheet: SheetBinding,
}
