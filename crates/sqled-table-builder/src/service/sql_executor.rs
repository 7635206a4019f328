//! Staging executor backed by a database connection

use std::sync::Arc;

use async_trait::async_trait;
use sqled_core::{Connection, Result, SqledError};

use super::StatementBuilder;
use crate::executor::{JoinSpec, MaterializeSpec, StageSpec, StagingExecutor};
use crate::models::ForeignKeyConstraint;
use crate::settings::BuilderSettings;

/// Runs engine operations as MySQL statements on one connection.
///
/// Staged datasets are `TEMPORARY` tables by default, which only live in the
/// session that created them, so every call must reach the same session.
pub struct SqlStagingExecutor {
    connection: Arc<dyn Connection>,
    statements: StatementBuilder,
}

impl SqlStagingExecutor {
    pub fn new(connection: Arc<dyn Connection>, settings: &BuilderSettings) -> Self {
        Self {
            connection,
            statements: StatementBuilder::new(settings),
        }
    }

    async fn run(&self, sql: String) -> Result<()> {
        tracing::debug!(sql = %sql, "executing statement");
        self.connection.execute(&sql, &[]).await?;
        Ok(())
    }
}

#[async_trait]
impl StagingExecutor for SqlStagingExecutor {
    async fn create_staged(&self, spec: &StageSpec) -> Result<()> {
        self.run(self.statements.stage(spec)).await
    }

    async fn count_rows(&self, dataset: &str) -> Result<u64> {
        let sql = self.statements.count_rows(dataset);
        tracing::debug!(sql = %sql, "executing query");
        let result = self.connection.query(&sql, &[]).await?;

        result
            .scalar()
            .and_then(|value| value.as_i64())
            .and_then(|count| u64::try_from(count).ok())
            .ok_or_else(|| SqledError::Query(format!("no row count returned for '{}'", dataset)))
    }

    async fn left_join(&self, spec: &JoinSpec) -> Result<()> {
        self.run(self.statements.left_join(spec)).await
    }

    async fn create_table_from(&self, spec: &MaterializeSpec) -> Result<()> {
        self.run(self.statements.create_table_from(spec)).await
    }

    async fn add_primary_key(&self, table: &str, columns: &[String]) -> Result<()> {
        self.run(self.statements.add_primary_key(table, columns)).await
    }

    async fn add_generated_key(&self, table: &str, key: &str) -> Result<()> {
        self.run(self.statements.add_generated_key(table, key)).await
    }

    async fn add_foreign_key(&self, table: &str, constraint: &ForeignKeyConstraint) -> Result<()> {
        self.run(self.statements.add_foreign_key(table, constraint)).await
    }

    async fn drop_dataset(&self, dataset: &str) -> Result<()> {
        self.run(self.statements.drop_dataset(dataset)).await
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.run(self.statements.drop_table(table)).await
    }
}
