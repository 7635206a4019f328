//! Models for table assembly
//!
//! The column selection the caller edits, the immutable request handed to
//! the engine, and the staged and assembled datasets the engine produces.

mod assembled_table;
mod column_selection;
mod foreign_reference;
mod request;
mod selected_column;
mod staged_dataset;

pub use assembled_table::{AssembledColumn, AssembledTable, ForeignKeyConstraint};
pub use column_selection::ColumnSelection;
pub use foreign_reference::ForeignReference;
pub use request::AssemblyRequest;
pub use selected_column::SelectedColumn;
pub use staged_dataset::{StagedDataset, StagingGroup};
