//! Build plans read from TOML files
//!
//! ```toml
//! destination = "customer_totals"
//! surrogate_key = "RowID"
//!
//! [[columns]]
//! table = "customers"
//! column = "name"
//! type = "varchar(255)"
//!
//! [[columns]]
//! table = "orders"
//! column = "customer_id"
//! type = "int(11)"
//! foreign = "customers.id"
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use sqled_services::{ColumnSelection, SelectedColumn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuildPlan {
    pub destination: Option<String>,
    pub surrogate_key: Option<String>,
    #[serde(default)]
    pub columns: Vec<SelectedColumn>,
}

impl BuildPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read build plan: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid build plan: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The plan's columns as a validated selection
    pub fn selection(&self) -> Result<ColumnSelection> {
        Ok(ColumnSelection::try_from(self.columns.clone())?)
    }
}

/// Split a `table.column` argument; the column is the text after the last `.`
pub fn parse_column_ref(raw: &str) -> Result<(String, String)> {
    match raw.trim().rsplit_once('.') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() => {
            Ok((table.to_string(), column.to_string()))
        }
        _ => bail!("Expected table.column, got '{}'", raw),
    }
}

/// Split a `key=value` argument
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("Expected key=value, got '{}'", raw),
    }
}
