// Cell addressing and loosely typed cell values

use std::fmt;

use serde::{Deserialize, Serialize};

pub const FLAG_TRUE: &str = "TRUE";
pub const FLAG_FALSE: &str = "FALSE";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub column: String,
    pub row: u32,
}

impl CellRef {
    pub fn new(column: impl AsRef<str>, row: u32) -> Self {
        Self {
            column: column.as_ref().trim().to_uppercase(),
            row,
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub cell: CellRef,
    pub value: String,
}

impl CellUpdate {
    pub fn new(column: impl AsRef<str>, row: u32, value: impl Into<String>) -> Self {
        Self {
            cell: CellRef::new(column, row),
            value: value.into(),
        }
    }

    pub fn flag(column: impl AsRef<str>, row: u32, value: bool) -> Self {
        Self::new(column, row, encode_flag(value))
    }
}

pub fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case(FLAG_TRUE)
}

pub fn encode_flag(value: bool) -> &'static str {
    if value {
        FLAG_TRUE
    } else {
        FLAG_FALSE
    }
}

/// Column letters as used in A1 notation: one to three ASCII letters.
pub fn is_valid_column(column: &str) -> bool {
    let trimmed = column.trim();
    !trimmed.is_empty() && trimmed.len() <= 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn join_list(values: &[String]) -> String {
    values.join(", ")
}

pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
