//! In-memory executor that records every call

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqled_core::{Result, SqledError};

use crate::executor::{JoinSpec, MaterializeSpec, StageSpec, StagingExecutor};
use crate::models::ForeignKeyConstraint;

/// Operation that should fail when reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailPoint {
    /// Staging of the given source table
    Stage(String),
    /// Counting the staged copy of the given source table
    Count(String),
    /// The nth join, starting at 1
    Join(usize),
    Materialize,
    PrimaryKey,
    GeneratedKey,
    /// The nth foreign key, starting at 1
    ForeignKey(usize),
    /// Dropping the given dataset
    Drop(String),
}

#[derive(Default)]
struct Recorded {
    staged: Vec<StageSpec>,
    joins: Vec<JoinSpec>,
    materialized: Vec<MaterializeSpec>,
    primary_keys: Vec<Vec<String>>,
    generated_keys: Vec<String>,
    foreign_keys: Vec<ForeignKeyConstraint>,
    created: Vec<String>,
    dropped: Vec<String>,
    dropped_tables: Vec<String>,
}

pub struct RecordingExecutor {
    row_counts: HashMap<String, u64>,
    fail_at: Vec<FailPoint>,
    recorded: Mutex<Recorded>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            row_counts: HashMap::new(),
            fail_at: Vec::new(),
            recorded: Mutex::new(Recorded::default()),
        }
    }

    /// Rows the staged copy of `source_table` reports
    pub fn with_rows(mut self, source_table: &str, rows: u64) -> Self {
        self.row_counts.insert(source_table.to_string(), rows);
        self
    }

    pub fn failing_at(mut self, point: FailPoint) -> Self {
        self.fail_at.push(point);
        self
    }

    pub fn staged(&self) -> Vec<StageSpec> {
        self.recorded.lock().staged.clone()
    }

    pub fn joins(&self) -> Vec<JoinSpec> {
        self.recorded.lock().joins.clone()
    }

    pub fn materialized(&self) -> Vec<MaterializeSpec> {
        self.recorded.lock().materialized.clone()
    }

    pub fn primary_keys(&self) -> Vec<Vec<String>> {
        self.recorded.lock().primary_keys.clone()
    }

    pub fn generated_keys(&self) -> Vec<String> {
        self.recorded.lock().generated_keys.clone()
    }

    pub fn foreign_keys(&self) -> Vec<ForeignKeyConstraint> {
        self.recorded.lock().foreign_keys.clone()
    }

    /// Datasets created, in creation order
    pub fn created(&self) -> Vec<String> {
        self.recorded.lock().created.clone()
    }

    /// Datasets dropped, in drop order
    pub fn dropped(&self) -> Vec<String> {
        self.recorded.lock().dropped.clone()
    }

    pub fn dropped_tables(&self) -> Vec<String> {
        self.recorded.lock().dropped_tables.clone()
    }

    /// Datasets created and never dropped
    pub fn residual(&self) -> Vec<String> {
        let recorded = self.recorded.lock();
        recorded
            .created
            .iter()
            .filter(|name| !recorded.dropped.contains(name))
            .cloned()
            .collect()
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        if self.fail_at.contains(&point) {
            return Err(SqledError::Query(format!("simulated failure at {point:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl StagingExecutor for RecordingExecutor {
    async fn create_staged(&self, spec: &StageSpec) -> Result<()> {
        self.check(FailPoint::Stage(spec.source_table.clone()))?;
        let mut recorded = self.recorded.lock();
        recorded.staged.push(spec.clone());
        recorded.created.push(spec.staging_name.clone());
        Ok(())
    }

    async fn count_rows(&self, dataset: &str) -> Result<u64> {
        let source = self
            .recorded
            .lock()
            .staged
            .iter()
            .find(|spec| spec.staging_name == dataset)
            .map(|spec| spec.source_table.clone())
            .unwrap_or_default();
        self.check(FailPoint::Count(source.clone()))?;
        Ok(self.row_counts.get(&source).copied().unwrap_or(0))
    }

    async fn left_join(&self, spec: &JoinSpec) -> Result<()> {
        let step = self.recorded.lock().joins.len() + 1;
        self.check(FailPoint::Join(step))?;
        let mut recorded = self.recorded.lock();
        recorded.joins.push(spec.clone());
        recorded.created.push(spec.target.clone());
        Ok(())
    }

    async fn create_table_from(&self, spec: &MaterializeSpec) -> Result<()> {
        self.check(FailPoint::Materialize)?;
        self.recorded.lock().materialized.push(spec.clone());
        Ok(())
    }

    async fn add_primary_key(&self, _table: &str, columns: &[String]) -> Result<()> {
        self.check(FailPoint::PrimaryKey)?;
        self.recorded.lock().primary_keys.push(columns.to_vec());
        Ok(())
    }

    async fn add_generated_key(&self, _table: &str, key: &str) -> Result<()> {
        self.check(FailPoint::GeneratedKey)?;
        self.recorded.lock().generated_keys.push(key.to_string());
        Ok(())
    }

    async fn add_foreign_key(&self, _table: &str, constraint: &ForeignKeyConstraint) -> Result<()> {
        let nth = self.recorded.lock().foreign_keys.len() + 1;
        self.check(FailPoint::ForeignKey(nth))?;
        self.recorded.lock().foreign_keys.push(constraint.clone());
        Ok(())
    }

    async fn drop_dataset(&self, dataset: &str) -> Result<()> {
        self.check(FailPoint::Drop(dataset.to_string()))?;
        self.recorded.lock().dropped.push(dataset.to_string());
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.check(FailPoint::Drop(table.to_string()))?;
        self.recorded.lock().dropped_tables.push(table.to_string());
        Ok(())
    }
}
