//! Key constraints on the assembled table

use sqled_core::SqledError;

use crate::error::TableBuildError;
use crate::executor::StagingExecutor;
use crate::models::{AssembledTable, AssemblyRequest, ForeignKeyConstraint};

/// Add the primary or generated key, then the foreign keys in selection order.
///
/// Applied constraints are recorded on `table` as they succeed. Parsing stops
/// at the first malformed foreign key; whatever was applied before it stays.
pub(crate) async fn apply_constraints(
    executor: &dyn StagingExecutor,
    table: &mut AssembledTable,
    request: &AssemblyRequest,
) -> Result<(), TableBuildError> {
    let constraint_failure = |cause: SqledError| TableBuildError::ConstraintApplication { cause };

    if let Some(key) = request.surrogate_key() {
        executor
            .add_generated_key(&table.name, key)
            .await
            .map_err(constraint_failure)?;
        table.set_generated_key(key);
        tracing::debug!(table = %table.name, key = %key, "added generated key");
    } else {
        let primary = request.primary_columns();
        if !primary.is_empty() {
            executor
                .add_primary_key(&table.name, &primary)
                .await
                .map_err(constraint_failure)?;
            tracing::debug!(table = %table.name, columns = ?primary, "added primary key");
            table.primary_key_columns = primary;
        }
    }

    for column in request.columns() {
        let Some(parsed) = column.foreign_key() else {
            continue;
        };
        let reference = parsed?;
        let constraint = ForeignKeyConstraint {
            local_column: column.column_name.clone(),
            referenced_table: reference.table,
            referenced_column: reference.column,
        };

        executor
            .add_foreign_key(&table.name, &constraint)
            .await
            .map_err(constraint_failure)?;
        tracing::debug!(
            table = %table.name,
            column = %constraint.local_column,
            references = %format!("{}.{}", constraint.referenced_table, constraint.referenced_column),
            "added foreign key"
        );
        table.foreign_keys.push(constraint);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::testing::RecordingExecutor;
    use crate::models::{AssembledColumn, ColumnSelection, SelectedColumn};

    fn table_for(request: &AssemblyRequest) -> AssembledTable {
        AssembledTable::new(
            request.destination(),
            request
                .columns()
                .iter()
                .map(|c| AssembledColumn::new(c.column_name.clone(), ""))
                .collect(),
        )
    }

    fn request(columns: Vec<SelectedColumn>, surrogate: Option<&str>) -> AssemblyRequest {
        let selection = ColumnSelection::try_from(columns).unwrap();
        AssemblyRequest::from_selection(&selection, "report", surrogate.map(str::to_string)).unwrap()
    }

    #[tokio::test]
    async fn test_composite_primary_key() {
        let executor = Arc::new(RecordingExecutor::new());
        let request = request(
            vec![
                SelectedColumn::new("a", "x").primary_key(),
                SelectedColumn::new("a", "y"),
                SelectedColumn::new("b", "z").primary_key(),
            ],
            None,
        );
        let mut table = table_for(&request);

        apply_constraints(executor.as_ref(), &mut table, &request)
            .await
            .unwrap();

        assert_eq!(executor.primary_keys(), vec![vec!["x".to_string(), "z".to_string()]]);
        assert_eq!(table.primary_key_columns, vec!["x".to_string(), "z".to_string()]);
        assert!(executor.generated_keys().is_empty());
    }

    #[tokio::test]
    async fn test_generated_key_replaces_primary_key_step() {
        let executor = Arc::new(RecordingExecutor::new());
        let request = request(vec![SelectedColumn::new("a", "x")], Some("RowID"));
        let mut table = table_for(&request);

        apply_constraints(executor.as_ref(), &mut table, &request)
            .await
            .unwrap();

        assert!(executor.primary_keys().is_empty());
        assert_eq!(executor.generated_keys(), vec!["RowID".to_string()]);
        assert_eq!(table.column_names(), vec!["RowID", "x"]);
    }

    #[tokio::test]
    async fn test_foreign_keys_stop_at_first_malformed_entry() {
        let executor = Arc::new(RecordingExecutor::new());
        let request = request(
            vec![
                SelectedColumn::new("orders", "id").primary_key(),
                SelectedColumn::new("orders", "customer_id").references("customers(id)"),
                SelectedColumn::new("orders", "product_id").references("productsid"),
                SelectedColumn::new("orders", "store_id").references("stores.id"),
            ],
            None,
        );
        let mut table = table_for(&request);

        let err = apply_constraints(executor.as_ref(), &mut table, &request)
            .await
            .unwrap_err();

        assert!(matches!(err, TableBuildError::InvalidForeignKeySyntax { ref raw } if raw == "productsid"));
        assert_eq!(executor.primary_keys().len(), 1);
        assert_eq!(
            executor.foreign_keys(),
            vec![ForeignKeyConstraint {
                local_column: "customer_id".into(),
                referenced_table: "customers".into(),
                referenced_column: "id".into(),
            }]
        );
        assert_eq!(table.foreign_keys.len(), 1);
    }
}
