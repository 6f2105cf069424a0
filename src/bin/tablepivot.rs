//! tablepivot: transpose tables from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Print the statement for one table
//! tablepivot generate orders --database-url postgres://localhost/shop
//!
//! # Generate offline from a catalog file
//! tablepivot generate orders --catalog catalog.json --dialect snowflake
//!
//! # Pivot several tables
//! tablepivot run orders customers --row-cap 500
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use tablepivot::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tablepivot")]
#[command(version)]
#[command(about = "Transpose tables: columns become rows, rows become columns", long_about = None)]
#[command(after_help = "EXAMPLES:
    tablepivot generate orders --catalog catalog.json
    tablepivot run orders customers --row-cap 500
    tablepivot run orders --dry-run --format json")]
struct Cli {
    /// Database connection URL (postgres:// or sqlite:)
    #[arg(long, global = true, env = "TABLEPIVOT_DATABASE_URL")]
    database_url: Option<String>,

    /// SQL dialect of the generated statements
    #[arg(long, global = true)]
    dialect: Option<Dialect>,

    /// Configuration file (defaults to ./tablepivot.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the transpose statement for one table
    Generate {
        /// Table to transpose
        table: String,

        /// Maximum number of source rows turned into columns
        #[arg(short, long)]
        row_cap: Option<u64>,

        /// Read metadata from a JSON or TOML catalog file instead of a database
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Write the statement to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate and execute transposes for a list of tables
    Run {
        /// Tables to transpose, in order
        #[arg(required = true)]
        tables: Vec<String>,

        /// Maximum number of source rows turned into columns
        #[arg(short, long)]
        row_cap: Option<u64>,

        /// Read metadata from a catalog file (requires --dry-run)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Print statements instead of executing them
        #[arg(long)]
        dry_run: bool,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Prints statements instead of running them.
struct DryRun;

impl StatementExecutor for DryRun {
    async fn execute_statement(&self, sql: &str) -> PivotResult<u64> {
        println!("{}", sql.white());
        println!();
        Ok(0)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tablepivot=debug" } else { "tablepivot=warn" };
    let filter =
        EnvFilter::try_from_env("TABLEPIVOT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the selected command. `Ok(false)` means at least one table failed.
async fn dispatch(cli: &Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => PivotConfig::from_file(path)?,
        None => PivotConfig::load()?,
    };
    let database_url = cli
        .database_url
        .clone()
        .or_else(|| config.database.url.clone());

    match &cli.command {
        Commands::Generate {
            table,
            row_cap,
            catalog,
            output,
        } => {
            let row_cap = row_cap.map(RowCap::new).unwrap_or_else(|| config.row_cap());
            let table = TableIdentifier::parse(table)?;

            let statement = match catalog {
                Some(path) => {
                    let catalog = MemoryCatalog::load(path)
                        .with_context(|| format!("loading catalog {}", path.display()))?;
                    let dialect = cli.dialect.unwrap_or_else(|| config.dialect());
                    tablepivot::generate(&catalog, dialect, &table, row_cap).await?
                }
                None => {
                    let db = connect(database_url.as_deref()).await?;
                    let dialect = cli.dialect.unwrap_or(db.dialect());
                    tablepivot::generate(&db, dialect, &table, row_cap).await?
                }
            };

            if let Some(path) = output {
                std::fs::write(path, statement.as_str())
                    .with_context(|| format!("writing {}", path.display()))?;
                println!(
                    "{} Wrote statement for {} to {}",
                    "✓".green(),
                    statement.destination().cyan(),
                    path.display()
                );
            } else {
                println!("{}", statement);
            }
            Ok(true)
        }
        Commands::Run {
            tables,
            row_cap,
            catalog,
            dry_run,
            format,
        } => {
            let row_cap = row_cap.map(RowCap::new).unwrap_or_else(|| config.row_cap());

            let report = match (catalog, *dry_run) {
                (Some(_), false) => {
                    return Err(anyhow!(
                        "--catalog only describes metadata; add --dry-run or use --database-url"
                    ));
                }
                (Some(path), true) => {
                    let catalog = MemoryCatalog::load(path)
                        .with_context(|| format!("loading catalog {}", path.display()))?;
                    let dialect = cli.dialect.unwrap_or_else(|| config.dialect());
                    tablepivot::run_all(&catalog, &DryRun, dialect, tables.as_slice(), row_cap).await
                }
                (None, dry_run) => {
                    let db = connect(database_url.as_deref()).await?;
                    let dialect = cli.dialect.unwrap_or(db.dialect());
                    if dry_run {
                        tablepivot::run_all(&db, &DryRun, dialect, tables.as_slice(), row_cap).await
                    } else {
                        tablepivot::run_all(&db, &db, dialect, tables.as_slice(), row_cap).await
                    }
                }
            };

            print_report(&report, format);
            Ok(report.is_success())
        }
    }
}

async fn connect(url: Option<&str>) -> Result<PivotDB> {
    let url = url.ok_or_else(|| {
        anyhow!("No database URL. Use --database-url, set TABLEPIVOT_DATABASE_URL or add [database] url to tablepivot.toml")
    })?;
    Ok(PivotDB::connect(url).await?)
}

fn print_report(report: &BatchResult, format: &OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", report.to_json()),
        OutputFormat::Text => {
            for outcome in report.outcomes() {
                match outcome.status {
                    Status::Success => println!("{} {}", "✓".green(), outcome),
                    Status::Error => println!("{} {}", "✗".red(), outcome.to_string().red()),
                }
            }
            println!();
            println!(
                "{} pivoted, {} failed (row cap {})",
                report.succeeded().to_string().green(),
                report.failed().to_string().red(),
                report.row_cap.to_string().cyan()
            );
        }
    }
}
