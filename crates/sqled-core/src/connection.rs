//! Connection trait

use crate::{QueryResult, Result, StatementResult, Value};
use async_trait::async_trait;

/// A database connection
///
/// Statements on one connection run on the same server session, so
/// session-scoped objects such as `TEMPORARY` tables stay visible between
/// calls.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "mysql")
    fn driver_name(&self) -> &str;

    /// Execute a statement that does not return rows (DDL, INSERT/UPDATE/DELETE)
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Execute a query that returns rows (SELECT, SHOW)
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Get the dialect identifier for this connection (e.g., "mysql")
    fn dialect_id(&self) -> Option<&'static str> {
        None
    }

    /// Name of the database selected for this session, if any
    fn current_database(&self) -> Option<&str> {
        None
    }

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}
