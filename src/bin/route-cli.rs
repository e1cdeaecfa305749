use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use identity_router::config::load_config;
use identity_router::observability::logging;
use identity_router::routing::rewriter::{is_directory, substitute_prefix};
use identity_router::routing::{resolve_within, rewrite, RoutingTable};
use identity_router::store::SqlStore;

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Inspect identity-router configuration and routing decisions", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "identity-router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the compiled routing table
    Check,
    /// Resolve an identity against the live store and print the decision
    Resolve {
        /// Authenticated identity to look up
        #[arg(short, long)]
        user: String,

        /// Request path, e.g. /dir/page.html
        #[arg(short, long)]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_stderr_logging();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let table = RoutingTable::from_config(&config.rewrite)
        .map_err(identity_router::config::ConfigError::Validation)?;

    match cli.command {
        Commands::Check => {
            let summary = json!({
                "location": table.location,
                "default_destination": table.default_destination,
                "rules": table.rules,
                "document_root": table.document_root,
                "identity_header": table.identity_header.as_str(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Resolve { user, path } => {
            if !table.covers(&path) {
                eprintln!("Error: {} is outside location {}", path, table.location);
                std::process::exit(2);
            }

            let store = SqlStore::connect(&config.database).await?;
            let deadline = std::time::Duration::from_millis(config.timeouts.resolve_ms);
            let resolution = resolve_within(&store, &user, &table.rules, deadline).await?;
            store.close().await;

            let destination = resolution.destination_or(&table.default_destination);
            let candidate = substitute_prefix(&path, &table.location, destination);
            let is_dir = is_directory(&table.document_root, &candidate).await;
            let decision = rewrite(&path, &table.location, destination, is_dir);

            let report = json!({
                "identity": user,
                "resolution": resolution,
                "destination": destination,
                "decision": decision,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
