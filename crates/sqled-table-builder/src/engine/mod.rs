//! Table assembly engine
//!
//! Drives one run through `Idle -> Staging -> Joining -> ConstraintApplication
//! -> Committed`, moving to `Failed` from any stage. Every staged dataset and
//! accumulator is dropped before [`TableAssemblyEngine::run`] returns.

mod assembler;
mod constraints;
mod ledger;
mod planner;
#[cfg(test)]
pub(crate) mod testing;

pub use assembler::JoinAssembler;
pub use ledger::StagingLedger;
pub use planner::StagingPlanner;

use std::fmt;
use std::sync::Arc;

use crate::error::{AssemblyError, TableBuildError};
use crate::executor::StagingExecutor;
use crate::models::{AssembledTable, AssemblyRequest};
use crate::settings::BuilderSettings;

/// Stage of an assembly run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Staging,
    Joining,
    ConstraintApplication,
    Committed,
    Failed { reason: String },
}

impl EngineState {
    /// `Committed` and `Failed` end a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Failed { .. })
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Staging => write!(f, "staging"),
            Self::Joining => write!(f, "joining"),
            Self::ConstraintApplication => write!(f, "constraint application"),
            Self::Committed => write!(f, "committed"),
            Self::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Builds a new table from an [`AssemblyRequest`]
pub struct TableAssemblyEngine {
    executor: Arc<dyn StagingExecutor>,
    settings: BuilderSettings,
    state: EngineState,
}

impl TableAssemblyEngine {
    pub fn new(executor: Arc<dyn StagingExecutor>, settings: BuilderSettings) -> Self {
        Self {
            executor,
            settings,
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Run one assembly.
    ///
    /// The engine may be run again after a terminal state; each run starts
    /// from `Idle`. On failure the destination table is dropped, except when
    /// a foreign key could not be parsed: the table is then kept with the
    /// constraints applied so far and returned in
    /// [`AssemblyError::committed`].
    pub async fn run(&mut self, request: &AssemblyRequest) -> Result<AssembledTable, AssemblyError> {
        self.transition(EngineState::Idle);
        tracing::info!(
            table = %request.destination(),
            columns = request.columns().len(),
            surrogate_key = request.surrogate_key(),
            "assembling table"
        );

        let mut ledger = StagingLedger::new(self.executor.clone());
        let outcome = self.execute(request, &mut ledger).await;
        ledger.release_all().await;
        let cleanup_failures = ledger.into_failures();

        match outcome {
            Ok(table) => {
                if !cleanup_failures.is_empty() {
                    tracing::warn!(
                        table = %table.name,
                        failures = cleanup_failures.len(),
                        "table assembled but some staged data was not dropped"
                    );
                }
                self.transition(EngineState::Committed);
                tracing::info!(table = %table.name, columns = table.columns.len(), "table assembled");
                Ok(table)
            }
            Err((kind, committed)) => {
                self.transition(EngineState::Failed {
                    reason: kind.to_string(),
                });
                tracing::error!(table = %request.destination(), error = %kind, "table assembly failed");
                Err(AssemblyError {
                    kind,
                    cleanup_failures,
                    committed,
                })
            }
        }
    }

    async fn execute(
        &mut self,
        request: &AssemblyRequest,
        ledger: &mut StagingLedger,
    ) -> Result<AssembledTable, (TableBuildError, Option<AssembledTable>)> {
        let executor = self.executor.clone();
        request
            .check_reserved_names(&self.settings)
            .map_err(|e| (e, None))?;

        self.transition(EngineState::Staging);
        let planner = StagingPlanner::new(&self.settings);
        let groups = planner.group(request.columns());
        let datasets = planner
            .stage(executor.as_ref(), ledger, groups)
            .await
            .map_err(|e| (e, None))?;

        self.transition(EngineState::Joining);
        let mut table = JoinAssembler::new(&self.settings)
            .assemble(executor.as_ref(), ledger, datasets, request)
            .await
            .map_err(|e| (e, None))?;

        self.transition(EngineState::ConstraintApplication);
        match constraints::apply_constraints(executor.as_ref(), &mut table, request).await {
            Ok(()) => {
                ledger.keep_destination();
                Ok(table)
            }
            Err(err @ TableBuildError::InvalidForeignKeySyntax { .. }) => {
                ledger.keep_destination();
                Err((err, Some(table)))
            }
            Err(err) => Err((err, None)),
        }
    }

    fn transition(&mut self, next: EngineState) {
        tracing::debug!(from = %self.state, to = %next, "engine state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::testing::{FailPoint, RecordingExecutor};
    use super::*;
    use crate::models::{ColumnSelection, SelectedColumn};

    fn engine(executor: &Arc<RecordingExecutor>) -> TableAssemblyEngine {
        TableAssemblyEngine::new(executor.clone(), BuilderSettings::default())
    }

    fn request(columns: Vec<SelectedColumn>, surrogate: Option<&str>) -> AssemblyRequest {
        let selection = ColumnSelection::try_from(columns).unwrap();
        AssemblyRequest::from_selection(&selection, "report", surrogate.map(str::to_string)).unwrap()
    }

    fn customer_orders() -> Vec<SelectedColumn> {
        vec![
            SelectedColumn::new("customers", "name"),
            SelectedColumn::new("customers", "email"),
            SelectedColumn::new("orders", "total"),
        ]
    }

    #[tokio::test]
    async fn test_customers_and_orders_end_to_end() {
        let executor = Arc::new(
            RecordingExecutor::new()
                .with_rows("customers", 3)
                .with_rows("orders", 3),
        );
        let mut engine = engine(&executor);

        let table = engine.run(&request(customer_orders(), None)).await.unwrap();

        assert_eq!(engine.state(), &EngineState::Committed);
        assert_eq!(table.name, "report");
        assert_eq!(table.column_names(), vec!["name", "email", "total"]);
        assert!(table.primary_key_columns.is_empty());
        assert!(table.foreign_keys.is_empty());
        assert!(table.generated_key_name.is_none());

        let staged: Vec<String> = executor.staged().into_iter().map(|s| s.source_table).collect();
        assert_eq!(staged, vec!["customers", "orders"]);
        assert_eq!(executor.joins().len(), 1);
        assert!(executor.primary_keys().is_empty());
        assert!(executor.foreign_keys().is_empty());
        assert!(executor.residual().is_empty());
        assert!(executor.dropped_tables().is_empty());
    }

    #[tokio::test]
    async fn test_largest_table_leads_the_join_chain() {
        let executor = Arc::new(
            RecordingExecutor::new()
                .with_rows("A", 5)
                .with_rows("B", 5)
                .with_rows("C", 9),
        );
        let mut engine = engine(&executor);

        let table = engine
            .run(&request(
                vec![
                    SelectedColumn::new("B", "b"),
                    SelectedColumn::new("A", "a"),
                    SelectedColumn::new("C", "c"),
                ],
                None,
            ))
            .await
            .unwrap();

        let joins = executor.joins();
        assert_eq!(joins[0].left, "t2");
        assert_eq!(joins[0].right, "t0");
        assert_eq!(joins[1].right, "t1");
        assert_eq!(table.column_names(), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_single_source_table_needs_no_join() {
        let executor = Arc::new(RecordingExecutor::new().with_rows("orders", 7));
        let mut engine = engine(&executor);

        let table = engine
            .run(&request(
                vec![
                    SelectedColumn::new("orders", "id").data_type("int(11)").primary_key(),
                    SelectedColumn::new("orders", "total").data_type("decimal(10,2)"),
                ],
                None,
            ))
            .await
            .unwrap();

        assert!(executor.joins().is_empty());
        assert_eq!(table.column_names(), vec!["id", "total"]);
        assert_eq!(table.columns[1].data_type, "decimal(10,2)");
        assert_eq!(table.primary_key_columns, vec!["id".to_string()]);
        assert!(executor.residual().is_empty());
    }

    #[tokio::test]
    async fn test_conflicting_key_policy_stops_before_staging() {
        let executor = Arc::new(RecordingExecutor::new());
        let selection = ColumnSelection::try_from(vec![
            SelectedColumn::new("orders", "id").primary_key(),
            SelectedColumn::new("orders", "total"),
        ])
        .unwrap();

        let err = AssemblyRequest::from_selection(&selection, "report", Some("RowID".into()))
            .unwrap_err();

        assert!(matches!(err, TableBuildError::ConflictingPrimaryKey { .. }));
        assert!(executor.created().is_empty());
    }

    #[tokio::test]
    async fn test_source_named_like_staged_data_stops_before_staging() {
        let executor = Arc::new(RecordingExecutor::new());
        let mut engine = engine(&executor);

        let err = engine
            .run(&request(
                vec![
                    SelectedColumn::new("a", "x"),
                    SelectedColumn::new("b", "y"),
                    SelectedColumn::new("t1", "z"),
                ],
                None,
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err.kind,
            TableBuildError::ReservedTableName { ref table } if table == "t1"
        ));
        assert!(matches!(engine.state(), EngineState::Failed { .. }));
        assert!(executor.created().is_empty());
        assert!(executor.dropped().is_empty());
    }

    #[tokio::test]
    async fn test_join_failure_leaves_no_staged_data() {
        let executor = Arc::new(
            RecordingExecutor::new()
                .with_rows("a", 4)
                .with_rows("b", 3)
                .with_rows("c", 2)
                .failing_at(FailPoint::Join(2)),
        );
        let mut engine = engine(&executor);

        let err = engine
            .run(&request(
                vec![
                    SelectedColumn::new("a", "x"),
                    SelectedColumn::new("b", "y"),
                    SelectedColumn::new("c", "z"),
                ],
                None,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, TableBuildError::Join { stage_index: 2, .. }));
        assert!(matches!(engine.state(), EngineState::Failed { .. }));
        assert!(engine.state().is_terminal());
        assert!(err.cleanup_failures.is_empty());
        assert!(err.committed.is_none());
        assert_eq!(executor.created(), vec!["t0", "t1", "t2", "acc1"]);
        assert!(executor.residual().is_empty());
        assert!(executor.materialized().is_empty());
    }

    #[tokio::test]
    async fn test_staging_failure_drops_earlier_datasets() {
        let executor = Arc::new(RecordingExecutor::new().failing_at(FailPoint::Stage("orders".into())));
        let mut engine = engine(&executor);

        let err = engine.run(&request(customer_orders(), None)).await.unwrap_err();

        assert!(
            matches!(err.kind, TableBuildError::Staging { ref source_table, .. } if source_table == "orders")
        );
        assert_eq!(executor.created(), vec!["t0"]);
        assert!(executor.residual().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_foreign_key_keeps_table_and_cleans_up() {
        let executor = Arc::new(RecordingExecutor::new().with_rows("orders", 2));
        let mut engine = engine(&executor);

        let err = engine
            .run(&request(
                vec![
                    SelectedColumn::new("orders", "id").primary_key(),
                    SelectedColumn::new("customers", "name"),
                    SelectedColumn::new("orders", "customer_id").references("customersid"),
                ],
                None,
            ))
            .await
            .unwrap_err();

        assert!(
            matches!(err.kind, TableBuildError::InvalidForeignKeySyntax { ref raw } if raw == "customersid")
        );
        let committed = err.committed.expect("destination should be kept");
        assert_eq!(committed.primary_key_columns, vec!["id".to_string()]);
        assert!(executor.residual().is_empty());
        assert!(executor.dropped_tables().is_empty());
    }

    #[tokio::test]
    async fn test_constraint_failure_rolls_back_destination() {
        let executor = Arc::new(RecordingExecutor::new().failing_at(FailPoint::GeneratedKey));
        let mut engine = engine(&executor);

        let err = engine
            .run(&request(customer_orders(), Some("RowID")))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, TableBuildError::ConstraintApplication { .. }));
        assert!(err.committed.is_none());
        assert_eq!(executor.dropped_tables(), vec!["report"]);
        assert!(executor.residual().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_failure_is_reported_next_to_primary_error() {
        let executor = Arc::new(
            RecordingExecutor::new()
                .with_rows("customers", 1)
                .failing_at(FailPoint::Materialize)
                .failing_at(FailPoint::Drop("acc1".into())),
        );
        let mut engine = engine(&executor);

        let err = engine.run(&request(customer_orders(), None)).await.unwrap_err();

        assert!(matches!(err.kind, TableBuildError::Join { stage_index: 2, .. }));
        assert_eq!(err.cleanup_failures.len(), 1);
        assert_eq!(err.cleanup_failures[0].dataset, "acc1");
        assert_eq!(executor.residual(), vec!["acc1"]);
        assert!(executor.dropped_tables().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_fail_a_built_table() {
        let executor = Arc::new(RecordingExecutor::new().failing_at(FailPoint::Drop("t0".into())));
        let mut engine = engine(&executor);

        let table = engine.run(&request(customer_orders(), None)).await.unwrap();

        assert_eq!(table.columns.len(), 3);
        assert_eq!(engine.state(), &EngineState::Committed);
    }

    #[tokio::test]
    async fn test_engine_can_run_again_after_failure() {
        let executor = Arc::new(RecordingExecutor::new());
        let mut engine = engine(&executor);

        let bad = request(
            vec![SelectedColumn::new("orders", "id").references("nowhere")],
            None,
        );
        assert!(engine.run(&bad).await.is_err());

        let table = engine.run(&request(customer_orders(), None)).await.unwrap();
        assert_eq!(table.columns.len(), 3);
        assert_eq!(engine.state(), &EngineState::Committed);
    }
}
