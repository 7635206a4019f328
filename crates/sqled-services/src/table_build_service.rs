//! Table build service
//!
//! Turns a column selection into a new table:
//! - Validating the selection and key policy before anything runs
//! - Running the assembly engine against a live connection
//! - Previewing the statements a run would issue
//!
//! Staged datasets are session-scoped, so every statement of one build goes
//! through the single connection passed in.

use std::collections::HashMap;
use std::sync::Arc;

use sqled_core::Connection;
use sqled_table_builder::{
    AssembledTable, AssemblyRequest, BuilderSettings, ColumnSelection, JoinAssembler,
    PreviewExecutor, SqlStagingExecutor, StagedDataset, StagingPlanner, TableAssemblyEngine,
};

use crate::error::{ServiceError, ServiceResult};
use crate::view_models::BuildPreview;

/// Service for building tables out of selected columns
pub struct TableBuildService {
    settings: BuilderSettings,
}

impl TableBuildService {
    pub fn new(settings: BuilderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Validate a selection and freeze it into a request.
    ///
    /// Fails before any storage is touched when the destination name is
    /// missing, nothing is selected, a generated key is combined with
    /// primary key columns, or a name clashes with the staged datasets.
    pub fn prepare(
        &self,
        selection: &ColumnSelection,
        destination: &str,
        surrogate_key: Option<String>,
    ) -> ServiceResult<AssemblyRequest> {
        let request = AssemblyRequest::from_selection(selection, destination, surrogate_key)?;
        request.check_reserved_names(&self.settings)?;
        Ok(request)
    }

    /// Build the destination table on `connection`
    #[tracing::instrument(skip(self, connection, request), fields(table = %request.destination()))]
    pub async fn build(
        &self,
        connection: Arc<dyn Connection>,
        request: &AssemblyRequest,
    ) -> ServiceResult<AssembledTable> {
        let executor = SqlStagingExecutor::new(connection, &self.settings);
        let mut engine = TableAssemblyEngine::new(Arc::new(executor), self.settings.clone());

        match engine.run(request).await {
            Ok(table) => {
                tracing::info!(table = %table.name, "Table built successfully");
                Ok(table)
            }
            Err(err) => {
                for failure in &err.cleanup_failures {
                    tracing::warn!(dataset = %failure.dataset, error = %failure.cause, "staged data left behind");
                }
                Err(ServiceError::BuildFailed(err))
            }
        }
    }

    /// Render the statements a build would issue without touching storage.
    ///
    /// `assumed_rows` gives the row count to assume for each source table;
    /// tables not listed are assumed empty.
    pub async fn preview(
        &self,
        request: &AssemblyRequest,
        assumed_rows: &HashMap<String, u64>,
    ) -> ServiceResult<BuildPreview> {
        let rows_for = |table: &str| assumed_rows.get(table).copied().unwrap_or(0);

        let datasets: Vec<StagedDataset> = StagingPlanner::new(&self.settings)
            .group(request.columns())
            .into_iter()
            .map(|group| {
                let rows = rows_for(&group.source_table);
                StagedDataset::from_group(group, rows)
            })
            .collect();
        let join_order = JoinAssembler::new(&self.settings)
            .order(datasets)
            .into_iter()
            .map(|d| d.source_table)
            .collect();

        let executor = Arc::new(assumed_rows.iter().fold(
            PreviewExecutor::new(&self.settings),
            |executor, (table, rows)| executor.with_rows(table.clone(), *rows),
        ));
        TableAssemblyEngine::new(executor.clone(), self.settings.clone())
            .run(request)
            .await?;

        Ok(BuildPreview {
            destination: request.destination().to_string(),
            join_order,
            statements: executor.statements(),
        })
    }
}

impl Default for TableBuildService {
    fn default() -> Self {
        Self::new(BuilderSettings::default())
    }
}
