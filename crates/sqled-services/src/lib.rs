//! SQLed Services Layer
//!
//! Sits between the front ends (the `sqled` CLI) and the table builder.
//!
//! # Architecture
//!
//! ```text
//! Front end (sqled-cli)
//!     ↓
//! Service Layer (sqled-services) ← This crate
//!     ↓
//! Domain Layer (sqled-table-builder)
//!     ↓
//! Infrastructure Layer (sqled-core, sqled-driver-mysql)
//! ```
//!
//! # Services
//!
//! - [`SourceCatalog`] - Lists source tables and describes their columns
//! - [`TableBuildService`] - Validates selections, builds tables and previews runs

mod error;
mod source_catalog;
mod table_build_service;
mod view_models;

pub use error::{ServiceError, ServiceResult};
pub use source_catalog::SourceCatalog;
pub use table_build_service::TableBuildService;
pub use view_models::{BuildPreview, ColumnInfo};

// Re-export the table builder types front ends need
pub use sqled_table_builder::{
    AssembledTable, AssemblyError, AssemblyRequest, BuilderSettings, ColumnSelection,
    SelectedColumn, TableBuildError,
};
