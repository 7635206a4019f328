//! Error types for table assembly

use sqled_core::SqledError;
use thiserror::Error;

use crate::models::AssembledTable;

/// Errors raised while validating a selection or assembling a table
#[derive(Debug, Error)]
pub enum TableBuildError {
    #[error("Column '{column}' is already part of the new table")]
    DuplicateColumn { column: String },

    #[error("Column '{column}' is not part of the new table")]
    UnknownColumn { column: String },

    #[error(
        "Key cannot be simultaneously generated and imported from existing columns ({})",
        columns.join(", ")
    )]
    ConflictingPrimaryKey { columns: Vec<String> },

    #[error("No columns were selected for the new table")]
    EmptySelection,

    #[error("A name is required for the new table")]
    MissingTableName,

    #[error("A name is required for the generated key")]
    MissingKeyName,

    #[error("Column '{column}' uses the name reserved for the staging row identity")]
    ReservedColumnName { column: String },

    #[error("Table '{table}' has the same name as a staged dataset of this build")]
    ReservedTableName { table: String },

    #[error("Failed to stage columns from '{source_table}': {cause}")]
    Staging {
        source_table: String,
        #[source]
        cause: SqledError,
    },

    /// Join steps are numbered from 1 to N - 1 for N staged datasets; stage
    /// N is creating the destination table from the final join result.
    #[error("Failed to join staged data at stage {stage_index}: {cause}")]
    Join {
        stage_index: usize,
        #[source]
        cause: SqledError,
    },

    #[error("Invalid foreign key '{raw}': expected Table.Column or Table(Column)")]
    InvalidForeignKeySyntax { raw: String },

    #[error("Failed to apply constraints: {cause}")]
    ConstraintApplication {
        #[source]
        cause: SqledError,
    },
}

/// A dataset that could not be dropped while cleaning up a run
#[derive(Debug)]
pub struct CleanupFailure {
    /// Staged dataset or table that was left behind
    pub dataset: String,
    /// Why the drop failed
    pub cause: SqledError,
}

impl std::fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not drop '{}': {}", self.dataset, self.cause)
    }
}

/// Failure of a whole assembly run.
///
/// `kind` is always the error that stopped the run. Drop failures met while
/// cleaning up are reported next to it in `cleanup_failures`.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct AssemblyError {
    #[source]
    pub kind: TableBuildError,
    /// Secondary failures raised while dropping staged data
    pub cleanup_failures: Vec<CleanupFailure>,
    /// The destination table, when it was created and left in place
    pub committed: Option<AssembledTable>,
}

impl AssemblyError {
    pub fn new(kind: TableBuildError) -> Self {
        Self {
            kind,
            cleanup_failures: Vec::new(),
            committed: None,
        }
    }

    /// Whether some staged data could not be dropped
    pub fn has_cleanup_failures(&self) -> bool {
        !self.cleanup_failures.is_empty()
    }
}

impl From<TableBuildError> for AssemblyError {
    fn from(kind: TableBuildError) -> Self {
        Self::new(kind)
    }
}
