//! MySQL statements and executors for the assembly engine

mod preview;
mod sql_executor;
mod statement_builder;

pub use preview::PreviewExecutor;
pub use sql_executor::SqlStagingExecutor;
pub use statement_builder::StatementBuilder;
