use sqled_table_builder::{AssemblyError, TableBuildError};
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors with user-friendly messages
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] TableBuildError),

    #[error("Table build failed: {0}")]
    BuildFailed(#[from] AssemblyError),

    #[error("Schema loading failed: {0}")]
    SchemaLoadFailed(String),

    #[error("Column not found: {table}.{column}")]
    ColumnNotFound { table: String, column: String },
}

impl ServiceError {
    /// The assembly failure behind a failed build, if any
    pub fn assembly_error(&self) -> Option<&AssemblyError> {
        match self {
            Self::BuildFailed(err) => Some(err),
            _ => None,
        }
    }
}
