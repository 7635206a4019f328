//! Staging planner
//!
//! Groups selected columns by source table and stages one dataset per group.

use sqled_core::SqledError;

use crate::engine::StagingLedger;
use crate::error::TableBuildError;
use crate::executor::{StageSpec, StagingExecutor};
use crate::models::{SelectedColumn, StagedDataset, StagingGroup};
use crate::settings::BuilderSettings;

pub struct StagingPlanner<'a> {
    settings: &'a BuilderSettings,
}

impl<'a> StagingPlanner<'a> {
    pub fn new(settings: &'a BuilderSettings) -> Self {
        Self { settings }
    }

    /// Split a selection into one group per distinct source table.
    ///
    /// Columns are stably sorted by source table name, so groups come out in
    /// table-name order and each group keeps the selection's relative column
    /// order. Staging names are assigned in that discovery order.
    pub fn group(&self, columns: &[SelectedColumn]) -> Vec<StagingGroup> {
        let mut sorted: Vec<&SelectedColumn> = columns.iter().collect();
        sorted.sort_by(|a, b| a.source_table.cmp(&b.source_table));

        let mut groups: Vec<StagingGroup> = Vec::new();
        for column in sorted {
            match groups.last_mut() {
                Some(group) if group.source_table == column.source_table => {
                    group.columns.push(column.column_name.clone());
                }
                _ => {
                    let discovery_index = groups.len();
                    groups.push(StagingGroup {
                        source_table: column.source_table.clone(),
                        staging_name: self.settings.staging_name(discovery_index),
                        columns: vec![column.column_name.clone()],
                        discovery_index,
                    });
                }
            }
        }
        groups
    }

    /// Create and count the staged copy of every group.
    ///
    /// Each created dataset is registered in `ledger` before its row count
    /// is taken, so a failure at any point leaves nothing untracked.
    pub async fn stage(
        &self,
        executor: &dyn StagingExecutor,
        ledger: &mut StagingLedger,
        groups: Vec<StagingGroup>,
    ) -> Result<Vec<StagedDataset>, TableBuildError> {
        let mut datasets = Vec::with_capacity(groups.len());

        for group in groups {
            let spec = StageSpec {
                staging_name: group.staging_name.clone(),
                source_table: group.source_table.clone(),
                columns: group.columns.clone(),
                identity_column: self.settings.identity_column.clone(),
            };
            let staging_failure = |cause: SqledError| TableBuildError::Staging {
                source_table: group.source_table.clone(),
                cause,
            };

            executor.create_staged(&spec).await.map_err(staging_failure)?;
            ledger.register(group.staging_name.clone());

            let row_count = executor
                .count_rows(&group.staging_name)
                .await
                .map_err(staging_failure)?;

            tracing::debug!(
                source_table = %group.source_table,
                dataset = %group.staging_name,
                columns = group.columns.len(),
                row_count,
                "staged source table"
            );
            datasets.push(StagedDataset::from_group(group, row_count));
        }

        Ok(datasets)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::engine::testing::{FailPoint, RecordingExecutor};

    fn column(table: &str, name: &str) -> SelectedColumn {
        SelectedColumn::new(table, name)
    }

    fn layout(groups: &[StagingGroup]) -> Vec<(String, String, Vec<String>)> {
        groups
            .iter()
            .map(|g| (g.source_table.clone(), g.staging_name.clone(), g.columns.clone()))
            .collect()
    }

    #[test]
    fn test_single_table_yields_one_group_in_selection_order() {
        let settings = BuilderSettings::default();
        let groups = StagingPlanner::new(&settings).group(&[
            column("orders", "total"),
            column("orders", "id"),
            column("orders", "placed_at"),
        ]);

        assert_eq!(
            layout(&groups),
            vec![(
                "orders".to_string(),
                "t0".to_string(),
                vec!["total".to_string(), "id".to_string(), "placed_at".to_string()]
            )]
        );
    }

    #[test]
    fn test_one_group_per_table_in_name_order() {
        let settings = BuilderSettings::default();
        let groups = StagingPlanner::new(&settings).group(&[
            column("orders", "total"),
            column("customers", "name"),
            column("products", "sku"),
            column("customers", "email"),
        ]);

        assert_eq!(groups.len(), 3);
        assert_eq!(
            layout(&groups),
            vec![
                (
                    "customers".to_string(),
                    "t0".to_string(),
                    vec!["name".to_string(), "email".to_string()]
                ),
                ("orders".to_string(), "t1".to_string(), vec!["total".to_string()]),
                ("products".to_string(), "t2".to_string(), vec!["sku".to_string()]),
            ]
        );
        assert_eq!(groups[2].discovery_index, 2);
    }

    #[test]
    fn test_grouping_ignores_interleaving_of_tables() {
        let settings = BuilderSettings::default();
        let planner = StagingPlanner::new(&settings);

        let interleaved = planner.group(&[
            column("b", "x"),
            column("a", "p"),
            column("b", "y"),
            column("a", "q"),
            column("b", "z"),
        ]);
        let contiguous = planner.group(&[
            column("a", "p"),
            column("a", "q"),
            column("b", "x"),
            column("b", "y"),
            column("b", "z"),
        ]);

        assert_eq!(layout(&interleaved), layout(&contiguous));
    }

    #[tokio::test]
    async fn test_stage_records_row_counts() {
        let settings = BuilderSettings::default();
        let executor = Arc::new(
            RecordingExecutor::new()
                .with_rows("customers", 12)
                .with_rows("orders", 40),
        );
        let mut ledger = StagingLedger::new(executor.clone());
        let planner = StagingPlanner::new(&settings);
        let groups = planner.group(&[column("orders", "total"), column("customers", "name")]);

        let datasets = planner
            .stage(executor.as_ref(), &mut ledger, groups)
            .await
            .unwrap();

        let counts: Vec<(&str, u64)> = datasets
            .iter()
            .map(|d| (d.staging_name.as_str(), d.row_count))
            .collect();
        assert_eq!(counts, vec![("t0", 12), ("t1", 40)]);
        assert_eq!(ledger.live(), &["t0".to_string(), "t1".to_string()]);
        assert!(executor
            .staged()
            .iter()
            .all(|spec| spec.identity_column == "staging_row_id"));
    }

    #[tokio::test]
    async fn test_count_failure_keeps_created_dataset_tracked() {
        let settings = BuilderSettings::default();
        let executor = Arc::new(RecordingExecutor::new().failing_at(FailPoint::Count("orders".into())));
        let mut ledger = StagingLedger::new(executor.clone());
        let planner = StagingPlanner::new(&settings);
        let groups = planner.group(&[column("customers", "name"), column("orders", "total")]);

        let err = planner
            .stage(executor.as_ref(), &mut ledger, groups)
            .await
            .unwrap_err();

        assert!(matches!(err, TableBuildError::Staging { ref source_table, .. } if source_table == "orders"));
        assert_eq!(ledger.live(), &["t0".to_string(), "t1".to_string()]);
    }
}
