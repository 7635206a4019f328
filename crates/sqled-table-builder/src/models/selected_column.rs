//! Selected column model

use serde::{Deserialize, Serialize};

use super::ForeignReference;
use crate::error::TableBuildError;

/// One column chosen for the new table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedColumn {
    /// Table the column is copied from
    #[serde(alias = "table")]
    pub source_table: String,
    /// Column name, kept as-is in the new table
    #[serde(alias = "column", alias = "name")]
    pub column_name: String,
    /// Type of the column in the new table (e.g. "varchar(255)")
    #[serde(default, alias = "type")]
    pub declared_type: String,
    /// Is this column part of the new table's primary key?
    #[serde(default, alias = "primary")]
    pub is_primary: bool,
    /// Raw foreign key target, `Table.Column` or `Table(Column)`
    #[serde(default, alias = "foreign", skip_serializing_if = "Option::is_none")]
    pub foreign_reference: Option<String>,
}

impl SelectedColumn {
    /// Create a column picked from `source_table`
    pub fn new(source_table: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            source_table: source_table.into(),
            column_name: column_name.into(),
            declared_type: String::new(),
            is_primary: false,
            foreign_reference: None,
        }
    }

    /// Builder: set the destination type
    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.declared_type = data_type.into();
        self
    }

    /// Builder: mark as part of the primary key
    pub fn primary_key(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Builder: set the raw foreign key target
    pub fn references(mut self, raw: impl Into<String>) -> Self {
        self.foreign_reference = Some(raw.into());
        self
    }

    /// `table.column`, as shown in the column list
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.source_table, self.column_name)
    }

    /// Raw foreign key text, ignoring blank entries
    pub fn foreign_text(&self) -> Option<&str> {
        self.foreign_reference
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
    }

    /// Parse the foreign key target, if one is set
    pub fn foreign_key(&self) -> Option<Result<ForeignReference, TableBuildError>> {
        self.foreign_text().map(ForeignReference::parse)
    }
}
