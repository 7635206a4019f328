//! Staged datasets produced by the planner

/// Columns of one source table waiting to be staged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingGroup {
    pub source_table: String,
    /// Name the staged copy will get
    pub staging_name: String,
    /// Column names in the order they were met in the sorted selection
    pub columns: Vec<String>,
    /// Position in discovery order
    pub discovery_index: usize,
}

/// A staged copy of one source table's selected columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDataset {
    pub source_table: String,
    pub staging_name: String,
    pub columns: Vec<String>,
    /// Rows in the staged copy, counted right after creation
    pub row_count: u64,
    pub discovery_index: usize,
}

impl StagedDataset {
    pub fn from_group(group: StagingGroup, row_count: u64) -> Self {
        Self {
            source_table: group.source_table,
            staging_name: group.staging_name,
            columns: group.columns,
            row_count,
            discovery_index: group.discovery_index,
        }
    }
}
