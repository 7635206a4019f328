//! Tracking of datasets that must be dropped before a run returns

use std::sync::Arc;

use crate::error::CleanupFailure;
use crate::executor::StagingExecutor;

/// Every dataset a run has created and not yet dropped.
///
/// Drop failures never stop the run; they are collected and handed back to
/// the caller next to the run's own result.
pub struct StagingLedger {
    executor: Arc<dyn StagingExecutor>,
    live: Vec<String>,
    destination: Option<String>,
    failures: Vec<CleanupFailure>,
}

impl StagingLedger {
    pub fn new(executor: Arc<dyn StagingExecutor>) -> Self {
        Self {
            executor,
            live: Vec::new(),
            destination: None,
            failures: Vec::new(),
        }
    }

    /// Record a dataset that now exists in storage
    pub fn register(&mut self, dataset: impl Into<String>) {
        self.live.push(dataset.into());
    }

    /// Record the destination table so a failed run removes it
    pub fn register_destination(&mut self, table: impl Into<String>) {
        self.destination = Some(table.into());
    }

    /// Keep the destination table in place
    pub fn keep_destination(&mut self) {
        self.destination = None;
    }

    /// Drop one dataset once it has been superseded
    pub async fn release(&mut self, dataset: &str) {
        let Some(index) = self.live.iter().position(|name| name == dataset) else {
            return;
        };
        let name = self.live.remove(index);
        self.drop_dataset(name).await;
    }

    /// Drop everything still live, newest first, then a registered destination
    pub async fn release_all(&mut self) {
        while let Some(name) = self.live.pop() {
            self.drop_dataset(name).await;
        }

        if let Some(table) = self.destination.take() {
            tracing::debug!(table = %table, "rolling back destination table");
            if let Err(cause) = self.executor.drop_table(&table).await {
                tracing::warn!(table = %table, error = %cause, "failed to drop destination table");
                self.failures.push(CleanupFailure {
                    dataset: table,
                    cause,
                });
            }
        }
    }

    /// Datasets created and not yet dropped
    pub fn live(&self) -> &[String] {
        &self.live
    }

    pub fn failures(&self) -> &[CleanupFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<CleanupFailure> {
        self.failures
    }

    async fn drop_dataset(&mut self, name: String) {
        tracing::debug!(dataset = %name, "dropping staged dataset");
        if let Err(cause) = self.executor.drop_dataset(&name).await {
            tracing::warn!(dataset = %name, error = %cause, "failed to drop staged dataset");
            self.failures.push(CleanupFailure {
                dataset: name,
                cause,
            });
        }
    }
}
