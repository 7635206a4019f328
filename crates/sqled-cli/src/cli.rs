//! `sqled`: build new MySQL tables out of columns of existing tables

mod logging;
mod plan;
mod settings;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use sqled_core::{Connection, ConnectionConfig, DatabaseDriver};
use sqled_driver_mysql::MySqlDriver;
use sqled_services::{
    AssembledTable, BuildPreview, ColumnSelection, SelectedColumn, ServiceError, SourceCatalog,
    TableBuildService,
};

use crate::plan::{BuildPlan, parse_assignment, parse_column_ref};
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "sqled")]
#[command(about = "Build new MySQL tables from columns of existing tables")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to <config dir>/sqled/settings.toml)
    #[arg(long, global = true, env = "SQLED_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output from every crate
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection overrides; each one beats the settings file
#[derive(Args)]
struct ConnectionArgs {
    /// Connection string: mysql://[user[:password]@]host[:port][/database]
    #[arg(long, global = true, env = "SQLED_URL", hide_env_values = true)]
    url: Option<String>,

    #[arg(long, global = true, env = "SQLED_HOST")]
    host: Option<String>,

    #[arg(long, global = true, env = "SQLED_PORT")]
    port: Option<u16>,

    #[arg(long, short = 'u', global = true, env = "SQLED_USER")]
    user: Option<String>,

    #[arg(long, global = true, env = "SQLED_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, short = 'd', global = true, env = "SQLED_DATABASE")]
    database: Option<String>,
}

impl ConnectionArgs {
    fn apply(&self, mut config: ConnectionConfig) -> Result<ConnectionConfig> {
        if let Some(url) = &self.url {
            config = ConnectionConfig::parse_connection_string(url)
                .context("Invalid connection string")?;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.username = Some(user.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(database) = &self.database {
            config.database = Some(database.clone());
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables of the current database
    Tables,

    /// List the columns of a table
    Columns {
        table: String,
    },

    /// Show how a column would be selected (type, primary key, foreign key)
    Describe {
        /// Column as table.column
        column: String,
    },

    /// Build a new table from selected columns
    Build {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Print the statements a build would run, without connecting
    Plan {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Assumed row count of a source table, as table=rows
        #[arg(long = "rows", value_name = "TABLE=ROWS")]
        rows: Vec<String>,
    },
}

#[derive(Args)]
struct SelectionArgs {
    /// Name of the new table (overrides the plan's destination)
    destination: Option<String>,

    /// Build plan file
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Column to include, as table.column; may be repeated
    #[arg(long = "column", short = 'c', value_name = "TABLE.COLUMN")]
    columns: Vec<String>,

    /// Add a generated auto-increment key with this name
    #[arg(long, value_name = "NAME", conflicts_with = "generate_key")]
    surrogate_key: Option<String>,

    /// Add a generated key with the default name from the settings
    #[arg(long)]
    generate_key: bool,

    /// Column to use as (part of) the primary key; may be repeated
    #[arg(long = "primary", value_name = "COLUMN")]
    primary: Vec<String>,

    /// Foreign key, as column=Table.Column or column=Table(Column)
    #[arg(long = "references", value_name = "COLUMN=TARGET")]
    references: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let _log_guard = logging::init(logging::LoggingConfig::from_settings(
        &settings.logging,
        cli.verbose,
    ))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(run(cli, settings))
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let service = TableBuildService::new(settings.builder.clone());

    if let Commands::Plan { selection, rows } = &cli.command {
        let (selection_model, destination, surrogate) =
            resolve_selection(selection, &settings, None).await?;
        let request = service.prepare(&selection_model, &destination, surrogate)?;
        let assumed = rows
            .iter()
            .map(|raw| {
                let (table, rows) = parse_assignment(raw)?;
                let rows: u64 = rows
                    .parse()
                    .with_context(|| format!("Invalid row count for '{}': {}", table, rows))?;
                Ok((table, rows))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        let preview = service.preview(&request, &assumed).await?;
        print_preview(&preview);
        return Ok(());
    }

    let config = cli.connection.apply(settings.connection.clone())?;
    let connection = MySqlDriver::new()
        .connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}:{}", config.host, config.get_port()))?;

    let outcome = run_connected(&cli.command, &settings, &service, connection.clone()).await;
    if let Err(e) = connection.close().await {
        tracing::warn!(error = %e, "failed to close connection");
    }
    outcome
}

async fn run_connected(
    command: &Commands,
    settings: &Settings,
    service: &TableBuildService,
    connection: Arc<dyn Connection>,
) -> Result<()> {
    let catalog = SourceCatalog::new(connection.clone());

    match command {
        Commands::Tables => {
            for table in catalog.list_tables().await? {
                println!("{}", table);
            }
        }
        Commands::Columns { table } => {
            let columns = catalog.list_columns(table).await?;
            let mut output = Table::new();
            output.load_preset(UTF8_FULL);
            output.set_header(vec!["Column", "Type", "Null", "Key", "Default"]);
            for column in columns {
                output.add_row(vec![
                    column.name,
                    column.data_type,
                    if column.nullable { "YES" } else { "NO" }.to_string(),
                    column.key,
                    column.default_value.unwrap_or_else(|| "NULL".to_string()),
                ]);
            }
            println!("{output}");
        }
        Commands::Describe { column } => {
            let (table, column) = parse_column_ref(column)?;
            let selected = catalog.describe_column(&table, &column).await?;
            print_columns(std::slice::from_ref(&selected));
        }
        Commands::Build { selection } => {
            let (selection_model, destination, surrogate) =
                resolve_selection(selection, settings, Some(&catalog)).await?;
            let request = service.prepare(&selection_model, &destination, surrogate)?;

            match service.build(connection, &request).await {
                Ok(table) => print_table(&table),
                Err(ServiceError::BuildFailed(err)) => {
                    for failure in &err.cleanup_failures {
                        eprintln!("warning: {}", failure);
                    }
                    if let Some(table) = &err.committed {
                        eprintln!("Table '{}' was created but not all keys were added.", table.name);
                        print_table(table);
                    }
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Plan { .. } => bail!("plan does not use a database connection"),
    }
    Ok(())
}

/// Collect the selection from a plan file, `--column` flags and key flags.
///
/// With a catalog, `--column` entries are described from the database so
/// they carry the source type and keys; without one they are taken as-is.
async fn resolve_selection(
    args: &SelectionArgs,
    settings: &Settings,
    catalog: Option<&SourceCatalog>,
) -> Result<(ColumnSelection, String, Option<String>)> {
    let plan = match &args.plan {
        Some(path) => BuildPlan::load(path)?,
        None => BuildPlan::default(),
    };
    let mut selection = plan.selection()?;

    let mut described = Vec::new();
    for raw in &args.columns {
        let (table, column) = parse_column_ref(raw)?;
        let selected = match catalog {
            Some(catalog) => catalog.describe_column(&table, &column).await?,
            None => SelectedColumn::new(table, column),
        };
        described.push(selected.column_name.clone());
        selection.add_column(selected)?;
    }

    // Explicit key flags replace the primary flags inherited from the source
    // tables; flags set in the plan file are the user's and stay
    let generate_key =
        args.generate_key || args.surrogate_key.is_some() || plan.surrogate_key.is_some();
    if !args.primary.is_empty() || generate_key {
        for column in &described {
            selection.set_primary(column, false)?;
        }
        for column in &args.primary {
            selection.set_primary(column, true)?;
        }
    }
    for raw in &args.references {
        let (column, target) = parse_assignment(raw)?;
        selection.set_foreign_reference(&column, Some(target))?;
    }

    let destination = match args.destination.clone().or(plan.destination) {
        Some(destination) => destination,
        None => bail!("No destination table given"),
    };
    let surrogate = if args.generate_key {
        Some(settings.builder.default_surrogate_key.clone())
    } else {
        args.surrogate_key.clone().or(plan.surrogate_key)
    };

    Ok((selection, destination, surrogate))
}

fn print_columns(columns: &[SelectedColumn]) {
    let mut output = Table::new();
    output.load_preset(UTF8_FULL);
    output.set_header(vec!["Column", "Type", "Primary", "References"]);
    for column in columns {
        output.add_row(vec![
            column.full_name(),
            column.declared_type.clone(),
            if column.is_primary { "yes" } else { "" }.to_string(),
            column.foreign_text().unwrap_or_default().to_string(),
        ]);
    }
    println!("{output}");
}

fn print_table(table: &AssembledTable) {
    let mut output = Table::new();
    output.load_preset(UTF8_FULL);
    output.set_header(vec!["Column", "Type", "Key"]);
    for column in &table.columns {
        let key = if table.primary_key_columns.contains(&column.name) {
            "PRI".to_string()
        } else if let Some(fk) = table.foreign_keys.iter().find(|fk| fk.local_column == column.name) {
            format!("-> {}.{}", fk.referenced_table, fk.referenced_column)
        } else {
            String::new()
        };
        output.add_row(vec![column.name.clone(), column.data_type.clone(), key]);
    }
    println!("Created table '{}'", table.name);
    println!("{output}");
}

fn print_preview(preview: &BuildPreview) {
    println!("-- {}: join order {}", preview.destination, preview.join_order.join(" -> "));
    for statement in &preview.statements {
        println!("{}", statement);
    }
}
