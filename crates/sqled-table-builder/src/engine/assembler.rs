//! Join assembler
//!
//! Orders staged datasets by row count and chains them with left outer joins
//! on the synthetic row identity, then materializes the destination table.

use std::collections::HashMap;

use crate::engine::StagingLedger;
use crate::error::TableBuildError;
use crate::executor::{JoinSpec, MaterializeSpec, StagingExecutor};
use crate::models::{AssembledColumn, AssembledTable, AssemblyRequest, StagedDataset};
use crate::settings::BuilderSettings;

pub struct JoinAssembler<'a> {
    settings: &'a BuilderSettings,
}

impl<'a> JoinAssembler<'a> {
    pub fn new(settings: &'a BuilderSettings) -> Self {
        Self { settings }
    }

    /// Join order: largest row count first, ties kept in discovery order
    pub fn order(&self, mut datasets: Vec<StagedDataset>) -> Vec<StagedDataset> {
        datasets.sort_by_key(|d| d.discovery_index);
        datasets.sort_by(|a, b| b.row_count.cmp(&a.row_count));
        datasets
    }

    /// Join every staged dataset and create the destination table.
    ///
    /// Superseded staged datasets and accumulators are released through
    /// `ledger` as soon as the next accumulator exists. The returned table
    /// has no constraints yet.
    pub async fn assemble(
        &self,
        executor: &dyn StagingExecutor,
        ledger: &mut StagingLedger,
        datasets: Vec<StagedDataset>,
        request: &AssemblyRequest,
    ) -> Result<AssembledTable, TableBuildError> {
        let ordered = self.order(datasets);
        let Some((first, rest)) = ordered.split_first() else {
            return Err(TableBuildError::EmptySelection);
        };
        let identity = &self.settings.identity_column;

        tracing::debug!(
            order = ?ordered.iter().map(|d| d.source_table.as_str()).collect::<Vec<_>>(),
            "join order"
        );

        let mut accumulator = first.staging_name.clone();
        let mut accumulated = first.columns.clone();

        for (offset, dataset) in rest.iter().enumerate() {
            let step = offset + 1;
            let target = self.settings.accumulator_name(step);
            let spec = JoinSpec {
                target: target.clone(),
                left: accumulator.clone(),
                left_columns: accumulated.clone(),
                right: dataset.staging_name.clone(),
                right_columns: dataset.columns.clone(),
                identity_column: identity.clone(),
            };

            executor
                .left_join(&spec)
                .await
                .map_err(|cause| TableBuildError::Join {
                    stage_index: step,
                    cause,
                })?;
            ledger.register(target.clone());
            tracing::debug!(step, left = %spec.left, right = %spec.right, target = %target, "joined staged data");

            ledger.release(&accumulator).await;
            ledger.release(&dataset.staging_name).await;

            accumulated.extend(dataset.columns.iter().cloned());
            accumulator = target;
        }

        let columns = typed_columns(&accumulated, request);
        let spec = MaterializeSpec {
            table: request.destination().to_string(),
            source: accumulator.clone(),
            columns: columns.clone(),
        };
        executor
            .create_table_from(&spec)
            .await
            .map_err(|cause| TableBuildError::Join {
                stage_index: ordered.len(),
                cause,
            })?;
        ledger.register_destination(request.destination());
        tracing::debug!(table = %spec.table, source = %spec.source, "materialized destination table");

        ledger.release(&accumulator).await;

        Ok(AssembledTable::new(request.destination(), columns))
    }
}

/// Pair each column with the type declared for it in the request
fn typed_columns(names: &[String], request: &AssemblyRequest) -> Vec<AssembledColumn> {
    let declared: HashMap<&str, &str> = request
        .columns()
        .iter()
        .map(|c| (c.column_name.as_str(), c.declared_type.trim()))
        .collect();

    names
        .iter()
        .map(|name| {
            AssembledColumn::new(
                name.clone(),
                declared.get(name.as_str()).copied().unwrap_or_default(),
            )
        })
        .collect()
}
