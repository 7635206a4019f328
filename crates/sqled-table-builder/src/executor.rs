//! Storage operations the engine depends on
//!
//! The engine only talks to storage through [`StagingExecutor`]. How an
//! operation is phrased (SQL text, an API call) is up to the implementor.

use async_trait::async_trait;
use sqled_core::Result;

use crate::models::{AssembledColumn, ForeignKeyConstraint};

/// Copy `columns` of `source_table` into a new staged dataset that carries
/// its own auto-increment `identity_column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub staging_name: String,
    pub source_table: String,
    pub columns: Vec<String>,
    pub identity_column: String,
}

/// Left outer join `left` with `right` on `identity_column` into `target`.
///
/// The result carries the left identity, `left_columns` from the left side
/// and `right_columns` from the right side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub target: String,
    pub left: String,
    pub left_columns: Vec<String>,
    pub right: String,
    pub right_columns: Vec<String>,
    pub identity_column: String,
}

/// Create the permanent `table` from `columns` of dataset `source`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeSpec {
    pub table: String,
    pub source: String,
    pub columns: Vec<AssembledColumn>,
}

/// Executor for staging, joining and constraint statements
#[async_trait]
pub trait StagingExecutor: Send + Sync {
    /// Create a staged dataset
    async fn create_staged(&self, spec: &StageSpec) -> Result<()>;

    /// Count rows of a dataset
    async fn count_rows(&self, dataset: &str) -> Result<u64>;

    /// Create `spec.target` as a left outer join of two datasets
    async fn left_join(&self, spec: &JoinSpec) -> Result<()>;

    /// Create a permanent table from a dataset
    async fn create_table_from(&self, spec: &MaterializeSpec) -> Result<()>;

    /// Add a (possibly composite) primary key
    async fn add_primary_key(&self, table: &str, columns: &[String]) -> Result<()>;

    /// Add an auto-increment integer key as the first column
    async fn add_generated_key(&self, table: &str, key: &str) -> Result<()>;

    async fn add_foreign_key(&self, table: &str, constraint: &ForeignKeyConstraint) -> Result<()>;

    /// Drop a staged or intermediate dataset
    async fn drop_dataset(&self, dataset: &str) -> Result<()>;

    /// Drop a permanent table, used to roll back a half-built destination
    async fn drop_table(&self, table: &str) -> Result<()>;
}
