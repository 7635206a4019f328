//! Descriptor of the table produced by a run

use serde::Serialize;

/// Column of the assembled table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledColumn {
    pub name: String,
    /// Declared type, empty when the type is inherited from the source
    pub data_type: String,
}

impl AssembledColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Foreign key added to the assembled table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyConstraint {
    pub local_column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// The committed destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledTable {
    pub name: String,
    pub columns: Vec<AssembledColumn>,
    pub primary_key_columns: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyConstraint>,
    /// Auto-increment surrogate key, the first column when present
    pub generated_key_name: Option<String>,
}

impl AssembledTable {
    pub fn new(name: impl Into<String>, columns: Vec<AssembledColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_key_columns: Vec::new(),
            foreign_keys: Vec::new(),
            generated_key_name: None,
        }
    }

    /// Record a generated key; it becomes the first column and the sole key
    pub fn set_generated_key(&mut self, key: impl Into<String>) {
        let key = key.into();
        self.columns.insert(0, AssembledColumn::new(key.clone(), "INT"));
        self.primary_key_columns = vec![key.clone()];
        self.generated_key_name = Some(key);
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key_columns.is_empty()
    }
}
