use std::collections::HashSet;

use anyhow::{anyhow, Result};

use roster_domain::{is_valid_column, ColumnLayout};

pub fn validate_guild_id(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("guild id is empty"));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(anyhow!("guild id '{}' may only contain letters, digits, '-' and '_'", value));
    }
    Ok(())
}

/// Every column must be a plain letter reference and no two logical fields
/// may share a column.
pub fn validate_column_layout(columns: &ColumnLayout, paired: bool) -> Result<()> {
    if paired && columns.team.is_none() {
        return Err(anyhow!("paired mode needs a team column"));
    }
    let mut seen = HashSet::new();
    for column in columns.all() {
        if !is_valid_column(column) {
            return Err(anyhow!("invalid column '{}'", column));
        }
        if !seen.insert(column.to_uppercase()) {
            return Err(anyhow!("column '{}' is mapped twice", column));
        }
    }
    Ok(())
}
