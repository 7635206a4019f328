use serde::Serialize;

/// Column of a source table as listed by `SHOW COLUMNS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    /// `PRI`, `UNI`, `MUL` or empty
    pub key: String,
    pub default_value: Option<String>,
}

impl ColumnInfo {
    pub fn is_primary_key(&self) -> bool {
        self.key.eq_ignore_ascii_case("PRI")
    }
}

/// Statements a build would issue, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPreview {
    pub destination: String,
    /// Source tables in join order
    pub join_order: Vec<String>,
    pub statements: Vec<String>,
}
