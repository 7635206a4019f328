//! Dry-run executor that renders statements instead of running them

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqled_core::Result;

use super::StatementBuilder;
use crate::executor::{JoinSpec, MaterializeSpec, StageSpec, StagingExecutor};
use crate::models::ForeignKeyConstraint;
use crate::settings::BuilderSettings;

/// Records the statements a run would issue.
///
/// Row counts are taken from assumed per-source-table counts (0 when a
/// table has none), so the preview shows the join order those counts imply.
pub struct PreviewExecutor {
    statements: StatementBuilder,
    assumed_rows: HashMap<String, u64>,
    staged_sources: Mutex<HashMap<String, String>>,
    rendered: Mutex<Vec<String>>,
}

impl PreviewExecutor {
    pub fn new(settings: &BuilderSettings) -> Self {
        Self {
            statements: StatementBuilder::new(settings),
            assumed_rows: HashMap::new(),
            staged_sources: Mutex::new(HashMap::new()),
            rendered: Mutex::new(Vec::new()),
        }
    }

    /// Assume `rows` rows in `source_table`
    pub fn with_rows(mut self, source_table: impl Into<String>, rows: u64) -> Self {
        self.assumed_rows.insert(source_table.into(), rows);
        self
    }

    /// Statements rendered so far, in issue order
    pub fn statements(&self) -> Vec<String> {
        self.rendered.lock().clone()
    }

    fn record(&self, sql: String) -> Result<()> {
        self.rendered.lock().push(sql);
        Ok(())
    }
}

#[async_trait]
impl StagingExecutor for PreviewExecutor {
    async fn create_staged(&self, spec: &StageSpec) -> Result<()> {
        self.staged_sources
            .lock()
            .insert(spec.staging_name.clone(), spec.source_table.clone());
        self.record(self.statements.stage(spec))
    }

    async fn count_rows(&self, dataset: &str) -> Result<u64> {
        self.record(self.statements.count_rows(dataset))?;
        let rows = self
            .staged_sources
            .lock()
            .get(dataset)
            .and_then(|source| self.assumed_rows.get(source))
            .copied()
            .unwrap_or(0);
        Ok(rows)
    }

    async fn left_join(&self, spec: &JoinSpec) -> Result<()> {
        self.record(self.statements.left_join(spec))
    }

    async fn create_table_from(&self, spec: &MaterializeSpec) -> Result<()> {
        self.record(self.statements.create_table_from(spec))
    }

    async fn add_primary_key(&self, table: &str, columns: &[String]) -> Result<()> {
        self.record(self.statements.add_primary_key(table, columns))
    }

    async fn add_generated_key(&self, table: &str, key: &str) -> Result<()> {
        self.record(self.statements.add_generated_key(table, key))
    }

    async fn add_foreign_key(&self, table: &str, constraint: &ForeignKeyConstraint) -> Result<()> {
        self.record(self.statements.add_foreign_key(table, constraint))
    }

    async fn drop_dataset(&self, dataset: &str) -> Result<()> {
        self.record(self.statements.drop_dataset(dataset))
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.record(self.statements.drop_table(table))
    }
}
