//! Foreign key target parsing

use std::fmt;
use std::str::FromStr;

use crate::error::TableBuildError;

/// Parsed foreign key target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignReference {
    /// Referenced table
    pub table: String,
    /// Referenced column
    pub column: String,
}

impl ForeignReference {
    /// Parse `Table.Column` or `Table(Column)`.
    ///
    /// The dotted form splits on the first `.`, so `db.table.col` reads as
    /// table `db`, column `table.col`. The parenthesised form takes the text
    /// before `(` as the table and the text strictly between `(` and the
    /// next `)` as the column. Empty table or column names are rejected.
    pub fn parse(raw: &str) -> Result<Self, TableBuildError> {
        let text = raw.trim();
        let invalid = || TableBuildError::InvalidForeignKeySyntax {
            raw: raw.to_string(),
        };

        let (table, column) = if let Some((table, column)) = text.split_once('.') {
            (table, column)
        } else if let Some((table, rest)) = text.split_once('(') {
            let (column, _) = rest.split_once(')').ok_or_else(invalid)?;
            (table, column)
        } else {
            return Err(invalid());
        };

        let (table, column) = (table.trim(), column.trim());
        if table.is_empty() || column.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            table: table.to_string(),
            column: column.to_string(),
        })
    }
}

impl FromStr for ForeignReference {
    type Err = TableBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ForeignReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}
