//! Supper Club - Application entry point
//!
//! CLI-based entry point that dispatches to the commands.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use supper_club::{
    cli::{Cli, Commands},
    commands,
    config::Config,
    infra::{install_panic_hook, ErrorLog},
};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing (verbose mode sets debug level)
    init_tracing(cli.verbose);

    // Panics land in the admin error log, then reach the default hook
    let error_log = ErrorLog::default();
    install_panic_hook(error_log.clone());

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e.detail());
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "Configuration loaded");

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config, error_log).await,
        Commands::Migrate(args) => commands::migrate::execute(args, config).await,
        Commands::Demo => commands::demo::execute(config, error_log).await,
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {}", e.detail());
        std::process::exit(1);
    }
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
