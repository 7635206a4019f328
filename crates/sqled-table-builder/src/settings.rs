//! Settings for table assembly

use serde::{Deserialize, Serialize};

/// Naming and storage options for a table assembly run.
///
/// Read from the `[builder]` table of the settings file; every field has a
/// default so an empty table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Prefix of staged dataset names (`t0`, `t1`, ...)
    pub staging_prefix: String,
    /// Prefix of intermediate join results (`acc1`, `acc2`, ...)
    pub accumulator_prefix: String,
    /// Name of the synthetic row identity column carried by staged data
    pub identity_column: String,
    /// Stage into session-scoped `TEMPORARY` tables
    pub temporary_staging: bool,
    /// Name offered for a generated primary key
    pub default_surrogate_key: String,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            staging_prefix: "t".to_string(),
            accumulator_prefix: "acc".to_string(),
            identity_column: "staging_row_id".to_string(),
            temporary_staging: true,
            default_surrogate_key: "RowID".to_string(),
        }
    }
}

impl BuilderSettings {
    /// Name of the staged dataset discovered at `index`
    pub fn staging_name(&self, index: usize) -> String {
        format!("{}{}", self.staging_prefix, index)
    }

    /// Name of the accumulator produced by join step `step`
    pub fn accumulator_name(&self, step: usize) -> String {
        format!("{}{}", self.accumulator_prefix, step)
    }
}
