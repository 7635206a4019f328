//! SQLed Core - Core abstractions and traits for the SQLed MySQL client
//!
//! This crate provides the fundamental traits and types that all other
//! SQLed crates depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection` - Trait for database connections
//! - `ConnectionConfig` - Session settings used to open a connection
//! - Common types like `Value`, `Row`, `QueryResult`, etc.

mod config;
mod connection;
mod driver;
mod error;
mod types;

pub use config::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use types::*;
