//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use sqled_core::{ColumnMeta, Connection, QueryResult, Result, Row, SqledError, StatementResult, Value};
use std::sync::Arc;

/// Mock connection for testing service-layer logic without a real database.
///
/// Answers queries by SQL pattern and records every statement it receives,
/// queries and commands alike, in one log.
pub struct MockConnection {
    pub name: String,
    pub should_fail: bool,
    /// SQL-pattern-based responses: if a query contains the pattern string,
    /// the corresponding result is returned.
    pub query_responses: Vec<(String, QueryResult)>,
    /// Statements containing one of these patterns fail
    pub failing_patterns: Vec<String>,
    /// Log of all SQL executed, for assertion in tests
    pub query_log: Arc<parking_lot::Mutex<Vec<String>>>,
    /// Parameters passed with each query, in query order
    pub param_log: Arc<parking_lot::Mutex<Vec<Vec<Value>>>>,
}

impl MockConnection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            should_fail: false,
            query_responses: vec![],
            failing_patterns: vec![],
            query_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
            param_log: Arc::new(parking_lot::Mutex::new(Vec::new())),
        }
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Register a response for queries containing the given SQL pattern.
    pub fn with_query_response(
        mut self,
        sql_contains: impl Into<String>,
        result: QueryResult,
    ) -> Self {
        self.query_responses.push((sql_contains.into(), result));
        self
    }

    /// Make statements containing the given SQL pattern fail
    pub fn failing_on(mut self, sql_contains: impl Into<String>) -> Self {
        self.failing_patterns.push(sql_contains.into());
        self
    }

    pub fn query_log(&self) -> Vec<String> {
        self.query_log.lock().clone()
    }

    pub fn param_log(&self) -> Vec<Vec<Value>> {
        self.param_log.lock().clone()
    }

    fn check(&self, sql: &str) -> Result<()> {
        self.query_log.lock().push(sql.to_string());
        if self.should_fail {
            return Err(SqledError::Query("Query failed".into()));
        }
        if let Some(pattern) = self.failing_patterns.iter().find(|p| sql.contains(p.as_str())) {
            return Err(SqledError::Query(format!("simulated failure on '{}'", pattern)));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        self.check(sql)?;
        Ok(StatementResult::command(0))
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.param_log.lock().push(params.to_vec());
        self.check(sql)?;

        for (pattern, result) in &self.query_responses {
            if sql.contains(pattern.as_str()) {
                return Ok(result.clone());
            }
        }
        Ok(QueryResult::empty())
    }

    fn current_database(&self) -> Option<&str> {
        Some(&self.name)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.should_fail
    }
}

/// Helper to create a mock QueryResult with the given columns and rows
pub fn mock_query_result(column_names: Vec<&str>, row_data: Vec<Vec<Value>>) -> QueryResult {
    let columns: Vec<ColumnMeta> = column_names
        .iter()
        .enumerate()
        .map(|(i, name)| ColumnMeta {
            name: name.to_string(),
            data_type: "TEXT".to_string(),
            nullable: true,
            ordinal: i,
            max_length: None,
        })
        .collect();

    let rows: Vec<Row> = row_data
        .into_iter()
        .map(|values| Row::new(column_names.iter().map(|s| s.to_string()).collect(), values))
        .collect();

    QueryResult {
        id: uuid::Uuid::new_v4(),
        columns,
        total_rows: Some(rows.len() as u64),
        rows,
        affected_rows: 0,
        execution_time_ms: 0,
    }
}

/// Single-value result, as returned by `SELECT COUNT(*)`
pub fn count_result(count: i64) -> QueryResult {
    mock_query_result(vec!["COUNT(*)"], vec![vec![Value::Int64(count)]])
}

pub fn text(value: &str) -> Value {
    Value::String(value.to_string())
}
