//! Table Builder for SQLed
//!
//! Assembles a new table out of columns picked from any number of existing
//! tables.
//!
//! ## Pipeline
//!
//! - **Column selection**: the caller collects [`SelectedColumn`]s in a
//!   [`ColumnSelection`] and freezes it into an [`AssemblyRequest`].
//! - **Staging**: columns are grouped by source table and each group is
//!   copied into a staged dataset tagged with a synthetic row identity.
//! - **Joining**: staged datasets are ordered by descending row count and
//!   chained with left outer joins on that identity, then materialized as
//!   the destination table.
//! - **Constraints**: primary key, generated surrogate key and foreign keys
//!   are applied to the destination table.
//!
//! Staged and intermediate datasets are dropped on every exit path.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqled_table_builder::{
//!     AssemblyRequest, BuilderSettings, ColumnSelection, SelectedColumn, SqlStagingExecutor,
//!     TableAssemblyEngine,
//! };
//!
//! let mut selection = ColumnSelection::new();
//! selection.add_column(SelectedColumn::new("customers", "name").data_type("varchar(255)"))?;
//! selection.add_column(SelectedColumn::new("orders", "total").data_type("decimal(10,2)"))?;
//!
//! let request = AssemblyRequest::from_selection(&selection, "customer_totals", None)?;
//! let settings = BuilderSettings::default();
//! let executor = SqlStagingExecutor::new(connection, &settings);
//! let table = TableAssemblyEngine::new(Arc::new(executor), settings)
//!     .run(&request)
//!     .await?;
//! ```

pub mod engine;
pub mod error;
pub mod executor;
pub mod models;
pub mod service;
pub mod settings;

// Re-exports for convenience
pub use engine::{EngineState, JoinAssembler, StagingLedger, StagingPlanner, TableAssemblyEngine};
pub use error::{AssemblyError, CleanupFailure, TableBuildError};
pub use executor::{JoinSpec, MaterializeSpec, StageSpec, StagingExecutor};
pub use models::{
    AssembledColumn, AssembledTable, AssemblyRequest, ColumnSelection, ForeignKeyConstraint,
    ForeignReference, SelectedColumn, StagedDataset, StagingGroup,
};
pub use service::{PreviewExecutor, SqlStagingExecutor, StatementBuilder};
pub use settings::BuilderSettings;
