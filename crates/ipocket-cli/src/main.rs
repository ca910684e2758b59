//! ipocket CLI - imports, exports and connector runs
//!
//! The HTTP surface lives elsewhere; this binary drives the import
//! pipeline and the external-inventory connectors against a local or
//! shared database.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ConnectorCommand, ExportCommand, ImportCommand};

#[derive(Parser)]
#[command(author, version, about = "IP inventory import/export tooling", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "IPOCKET_LOG_LEVEL", global = true)]
    log_level: String,

    /// Database URL, e.g. sqlite://ipocket.db?mode=rwc
    #[arg(
        long,
        default_value = "sqlite://ipocket.db?mode=rwc",
        env = "IPOCKET_DATABASE_URL",
        global = true
    )]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a bundle or CSV files
    Import(ImportCommand),
    /// Export the inventory as a bundle
    Export(ExportCommand),
    /// Scrape an external system into a bundle
    Connector(ConnectorCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins when set; otherwise keep our crates at the chosen
    // level and dependencies at warn
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()?
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "ipocket_cli={level},\
             ipocket_core={level},\
             ipocket_entities={level},\
             ipocket_database={level},\
             ipocket_migrations={level},\
             ipocket_audit={level},\
             ipocket_auth={level},\
             ipocket_inventory={level},\
             ipocket_import={level},\
             ipocket_import_types={level},\
             ipocket_connectors={level},\
             warn",
            level = cli.log_level
        ))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Import(command) => command.execute(&cli.database_url).await,
        Commands::Export(command) => command.execute(&cli.database_url).await,
        Commands::Connector(command) => command.execute(&cli.database_url).await,
    }
}
