//! Validated input of one assembly run

use std::collections::BTreeSet;

use super::{ColumnSelection, SelectedColumn};
use crate::error::TableBuildError;
use crate::settings::BuilderSettings;

/// Immutable snapshot of a selection plus the destination settings.
///
/// Built through [`AssemblyRequest::from_selection`], which runs every check
/// the engine relies on, so the engine never re-validates the key policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyRequest {
    destination: String,
    surrogate_key: Option<String>,
    columns: Vec<SelectedColumn>,
}

impl AssemblyRequest {
    pub fn from_selection(
        selection: &ColumnSelection,
        destination: impl Into<String>,
        surrogate_key: Option<String>,
    ) -> Result<Self, TableBuildError> {
        let destination: String = destination.into();
        let destination = destination.trim().to_string();
        if destination.is_empty() {
            return Err(TableBuildError::MissingTableName);
        }
        if selection.is_empty() {
            return Err(TableBuildError::EmptySelection);
        }

        let surrogate_key = match surrogate_key {
            Some(key) if key.trim().is_empty() => return Err(TableBuildError::MissingKeyName),
            Some(key) => Some(key.trim().to_string()),
            None => None,
        };
        selection.validate_key_policy(surrogate_key.is_some())?;

        Ok(Self {
            destination,
            surrogate_key,
            columns: selection.snapshot(),
        })
    }

    /// Reject names the run would shadow with its own datasets.
    ///
    /// Staged and intermediate datasets are named from `settings`, and a
    /// `TEMPORARY` dataset hides a real table of the same name for the rest
    /// of the session. A selected column may not take the name of the
    /// synthetic row identity either.
    pub fn check_reserved_names(&self, settings: &BuilderSettings) -> Result<(), TableBuildError> {
        if let Some(column) = self
            .columns
            .iter()
            .find(|c| c.column_name.eq_ignore_ascii_case(&settings.identity_column))
        {
            return Err(TableBuildError::ReservedColumnName {
                column: column.column_name.clone(),
            });
        }

        let sources: BTreeSet<&str> = self.columns.iter().map(|c| c.source_table.as_str()).collect();
        let reserved: Vec<String> = (0..sources.len())
            .map(|i| settings.staging_name(i))
            .chain((1..sources.len()).map(|step| settings.accumulator_name(step)))
            .collect();
        let clashes = |table: &str| {
            let name = table.rsplit('.').next().unwrap_or(table);
            reserved.iter().any(|r| r.eq_ignore_ascii_case(name))
        };

        if let Some(table) = sources.iter().copied().find(|t| clashes(*t)) {
            return Err(TableBuildError::ReservedTableName {
                table: table.to_string(),
            });
        }
        if clashes(self.destination.as_str()) {
            return Err(TableBuildError::ReservedTableName {
                table: self.destination.clone(),
            });
        }
        Ok(())
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn surrogate_key(&self) -> Option<&str> {
        self.surrogate_key.as_deref()
    }

    pub fn columns(&self) -> &[SelectedColumn] {
        &self.columns
    }

    /// Primary key columns in selection order
    pub fn primary_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.is_primary)
            .map(|c| c.column_name.clone())
            .collect()
    }
}
