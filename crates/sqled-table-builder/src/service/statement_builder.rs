//! SQL generation for staging, joining and constraints
//!
//! Generates MySQL statements for every [`StagingExecutor`] operation.
//! Identifiers are quoted with backticks; a `db.table` name is quoted part by
//! part. Declared column types are emitted as given.
//!
//! [`StagingExecutor`]: crate::executor::StagingExecutor

use crate::executor::{JoinSpec, MaterializeSpec, StageSpec};
use crate::models::ForeignKeyConstraint;
use crate::settings::BuilderSettings;

/// Statement generator for the staging executor
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    temporary: bool,
}

impl StatementBuilder {
    pub fn new(settings: &BuilderSettings) -> Self {
        Self {
            temporary: settings.temporary_staging,
        }
    }

    /// Quote a single identifier, doubling embedded backticks
    pub fn quote_ident(name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    /// Quote a possibly schema-qualified table name
    pub fn quote_table(name: &str) -> String {
        name.split('.')
            .map(Self::quote_ident)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn column_list(prefix: &str, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|c| format!("{}{}", prefix, Self::quote_ident(c)))
            .collect()
    }

    fn create_staging_table(&self) -> &'static str {
        if self.temporary {
            "CREATE TEMPORARY TABLE"
        } else {
            "CREATE TABLE"
        }
    }

    /// Copy the selected columns into a staged dataset with its own identity
    pub fn stage(&self, spec: &StageSpec) -> String {
        format!(
            "{} {} ({} INT NOT NULL AUTO_INCREMENT PRIMARY KEY) SELECT {} FROM {};",
            self.create_staging_table(),
            Self::quote_ident(&spec.staging_name),
            Self::quote_ident(&spec.identity_column),
            Self::column_list("", &spec.columns).join(", "),
            Self::quote_table(&spec.source_table),
        )
    }

    pub fn count_rows(&self, dataset: &str) -> String {
        format!("SELECT COUNT(*) FROM {};", Self::quote_table(dataset))
    }

    /// Left outer join two datasets on the identity into a new accumulator
    pub fn left_join(&self, spec: &JoinSpec) -> String {
        let identity = Self::quote_ident(&spec.identity_column);
        let mut select = vec![format!("l.{}", identity)];
        select.extend(Self::column_list("l.", &spec.left_columns));
        select.extend(Self::column_list("r.", &spec.right_columns));

        format!(
            "{} {} (PRIMARY KEY ({})) SELECT {} FROM {} AS l LEFT OUTER JOIN {} AS r ON l.{} = r.{};",
            self.create_staging_table(),
            Self::quote_ident(&spec.target),
            identity,
            select.join(", "),
            Self::quote_table(&spec.left),
            Self::quote_table(&spec.right),
            identity,
            identity,
        )
    }

    /// Create the destination table from a dataset.
    ///
    /// Columns are declared with their types only when every column has one;
    /// otherwise MySQL derives the types from the selected columns.
    pub fn create_table_from(&self, spec: &MaterializeSpec) -> String {
        let names: Vec<String> = spec.columns.iter().map(|c| Self::quote_ident(&c.name)).collect();
        let table = Self::quote_table(&spec.table);
        let select = format!("SELECT {} FROM {};", names.join(", "), Self::quote_table(&spec.source));

        let fully_typed = spec.columns.iter().all(|c| !c.data_type.trim().is_empty());
        if !fully_typed {
            return format!("CREATE TABLE {} {}", table, select);
        }

        let definitions: Vec<String> = spec
            .columns
            .iter()
            .zip(&names)
            .map(|(column, name)| format!("  {} {}", name, column.data_type.trim()))
            .collect();
        format!(
            "CREATE TABLE {} (\n{}\n) {}",
            table,
            definitions.join(",\n"),
            select
        )
    }

    pub fn add_primary_key(&self, table: &str, columns: &[String]) -> String {
        format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({});",
            Self::quote_table(table),
            Self::column_list("", columns).join(", ")
        )
    }

    /// Add an auto-increment key as the first column
    pub fn add_generated_key(&self, table: &str, key: &str) -> String {
        format!(
            "ALTER TABLE {} ADD {} INT AUTO_INCREMENT NOT NULL PRIMARY KEY FIRST;",
            Self::quote_table(table),
            Self::quote_ident(key)
        )
    }

    pub fn add_foreign_key(&self, table: &str, constraint: &ForeignKeyConstraint) -> String {
        format!(
            "ALTER TABLE {} ADD FOREIGN KEY ({}) REFERENCES {} ({});",
            Self::quote_table(table),
            Self::quote_ident(&constraint.local_column),
            Self::quote_table(&constraint.referenced_table),
            Self::quote_ident(&constraint.referenced_column)
        )
    }

    pub fn drop_dataset(&self, dataset: &str) -> String {
        if self.temporary {
            format!("DROP TEMPORARY TABLE IF EXISTS {};", Self::quote_table(dataset))
        } else {
            format!("DROP TABLE IF EXISTS {};", Self::quote_table(dataset))
        }
    }

    pub fn drop_table(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {};", Self::quote_table(table))
    }
}
