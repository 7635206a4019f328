//! Source table metadata
//!
//! Lists the tables and columns a new table can be built from, and describes
//! single columns from `information_schema` so a selection starts out with
//! the source column's type and keys.

use std::sync::Arc;

use sqled_core::{Connection, QueryResult, Row, Value};
use sqled_table_builder::{ColumnSelection, SelectedColumn, StatementBuilder};

use crate::error::{ServiceError, ServiceResult};
use crate::view_models::ColumnInfo;

const COLUMN_DETAILS_SQL: &str = "SELECT COLUMN_TYPE, COLUMN_KEY FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? AND COLUMN_NAME = ?";

const KEY_USAGE_SQL: &str = "SELECT CONSTRAINT_NAME, REFERENCED_TABLE_SCHEMA, REFERENCED_TABLE_NAME, \
     REFERENCED_COLUMN_NAME FROM information_schema.KEY_COLUMN_USAGE \
     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? AND COLUMN_NAME = ?";

/// Read-only view of the tables in the current database
pub struct SourceCatalog {
    connection: Arc<dyn Connection>,
}

impl SourceCatalog {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }

    /// Names of the tables in the current database
    #[tracing::instrument(skip(self))]
    pub async fn list_tables(&self) -> ServiceResult<Vec<String>> {
        let result = self.load("SHOW TABLES", &[]).await?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| row.get(0).and_then(Value::to_text))
            .collect())
    }

    /// Columns of `table` in table order
    #[tracing::instrument(skip(self))]
    pub async fn list_columns(&self, table: &str) -> ServiceResult<Vec<ColumnInfo>> {
        let sql = format!("SHOW COLUMNS FROM {}", StatementBuilder::quote_table(table));
        let result = self.load(&sql, &[]).await?;

        Ok(result
            .rows
            .iter()
            .map(|row| ColumnInfo {
                name: text(row, "Field").unwrap_or_default(),
                data_type: text(row, "Type").unwrap_or_default(),
                nullable: text(row, "Null").is_some_and(|n| n.eq_ignore_ascii_case("YES")),
                key: text(row, "Key").unwrap_or_default(),
                default_value: text(row, "Default"),
            })
            .collect())
    }

    /// Describe one column as a selection entry.
    ///
    /// The declared type is the source `COLUMN_TYPE`. The column is flagged
    /// primary when it is part of the source table's primary key, and gets a
    /// `Table.Column` foreign reference when the source column references
    /// another table.
    #[tracing::instrument(skip(self))]
    pub async fn describe_column(&self, table: &str, column: &str) -> ServiceResult<SelectedColumn> {
        let (schema, table_name) = match table.split_once('.') {
            Some((schema, name)) => (Value::String(schema.to_string()), name),
            None => (Value::Null, table),
        };
        let params = [
            schema,
            Value::String(table_name.to_string()),
            Value::String(column.to_string()),
        ];

        let details = self.load(COLUMN_DETAILS_SQL, &params).await?;
        let row = details.rows.first().ok_or_else(|| ServiceError::ColumnNotFound {
            table: table.to_string(),
            column: column.to_string(),
        })?;

        let mut selected = SelectedColumn::new(table, column)
            .data_type(text(row, "COLUMN_TYPE").unwrap_or_default());
        selected.is_primary = text(row, "COLUMN_KEY").is_some_and(|key| key.eq_ignore_ascii_case("PRI"));

        let usage = self.load(KEY_USAGE_SQL, &params).await?;
        for row in &usage.rows {
            if text(row, "CONSTRAINT_NAME").is_some_and(|name| name.eq_ignore_ascii_case("PRIMARY")) {
                selected.is_primary = true;
            }
            if let (Some(ref_table), Some(ref_column)) = (
                text(row, "REFERENCED_TABLE_NAME"),
                text(row, "REFERENCED_COLUMN_NAME"),
            ) {
                selected.foreign_reference = Some(format!("{}.{}", ref_table, ref_column));
            }
        }

        tracing::debug!(
            column = %selected.full_name(),
            data_type = %selected.declared_type,
            primary = selected.is_primary,
            foreign = selected.foreign_reference.as_deref(),
            "described column"
        );
        Ok(selected)
    }

    /// Describe `table.column` pairs into a selection, in the given order
    pub async fn select_columns(&self, columns: &[(String, String)]) -> ServiceResult<ColumnSelection> {
        let mut selection = ColumnSelection::new();
        for (table, column) in columns {
            let described = self.describe_column(table, column).await?;
            selection.add_column(described)?;
        }
        Ok(selection)
    }

    async fn load(&self, sql: &str, params: &[Value]) -> ServiceResult<QueryResult> {
        self.connection
            .query(sql, params)
            .await
            .map_err(|e| ServiceError::SchemaLoadFailed(e.to_string()))
    }
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get_by_name(column).and_then(Value::to_text)
}
