//! Column selection model

use serde::Serialize;

use super::SelectedColumn;
use crate::error::TableBuildError;

/// Ordered list of columns the new table will be built from.
///
/// Column names are unique within the selection, compared without regard
/// to ASCII case since MySQL column names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnSelection {
    columns: Vec<SelectedColumn>,
}

impl ColumnSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    pub fn add_column(&mut self, column: SelectedColumn) -> Result<(), TableBuildError> {
        if self.position(&column.column_name).is_some() {
            return Err(TableBuildError::DuplicateColumn {
                column: column.column_name,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Remove a column by name, returning it if it was selected
    pub fn remove_column(&mut self, column_name: &str) -> Option<SelectedColumn> {
        self.position(column_name)
            .map(|index| self.columns.remove(index))
    }

    /// Toggle primary key membership of a column
    pub fn set_primary(&mut self, column_name: &str, primary: bool) -> Result<(), TableBuildError> {
        self.get_mut(column_name)?.is_primary = primary;
        Ok(())
    }

    /// Set or clear the raw foreign key target of a column
    pub fn set_foreign_reference(
        &mut self,
        column_name: &str,
        reference: Option<String>,
    ) -> Result<(), TableBuildError> {
        self.get_mut(column_name)?.foreign_reference = reference;
        Ok(())
    }

    /// Check that a generated key is not combined with primary columns.
    ///
    /// Must pass before any staging starts.
    pub fn validate_key_policy(&self, generate_surrogate: bool) -> Result<(), TableBuildError> {
        let primary = self.primary_columns();
        if generate_surrogate && !primary.is_empty() {
            return Err(TableBuildError::ConflictingPrimaryKey {
                columns: primary.into_iter().map(str::to_string).collect(),
            });
        }
        Ok(())
    }

    /// Names of the columns flagged as primary, in selection order
    pub fn primary_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary)
            .map(|c| c.column_name.as_str())
            .collect()
    }

    pub fn get(&self, column_name: &str) -> Option<&SelectedColumn> {
        self.position(column_name).map(|index| &self.columns[index])
    }

    pub fn columns(&self) -> &[SelectedColumn] {
        &self.columns
    }

    /// Immutable copy handed to the engine
    pub fn snapshot(&self) -> Vec<SelectedColumn> {
        self.columns.clone()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn position(&self, column_name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.column_name.eq_ignore_ascii_case(column_name))
    }

    fn get_mut(&mut self, column_name: &str) -> Result<&mut SelectedColumn, TableBuildError> {
        match self.position(column_name) {
            Some(index) => Ok(&mut self.columns[index]),
            None => Err(TableBuildError::UnknownColumn {
                column: column_name.to_string(),
            }),
        }
    }
}

impl TryFrom<Vec<SelectedColumn>> for ColumnSelection {
    type Error = TableBuildError;

    fn try_from(columns: Vec<SelectedColumn>) -> Result<Self, Self::Error> {
        let mut selection = Self::new();
        for column in columns {
            selection.add_column(column)?;
        }
        Ok(selection)
    }
}
