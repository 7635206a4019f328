//! Database driver trait definition

use crate::{Connection, ConnectionConfig, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Driver identifier (e.g., "mysql")
    fn name(&self) -> &'static str;

    /// Human-readable name
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Default port for server-based databases
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Help text describing the connection string format
    fn connection_string_help(&self) -> &'static str {
        ""
    }

    /// Open a connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;
}
