//! CLI entry point.
//!
//! Parses arguments, initializes logging and hands off to the
//! dispatcher. Managed failures print their message and exit 1,
//! anything unexpected exits 2.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wpsnap_cli::Cli;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = wpsnap_cli::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
