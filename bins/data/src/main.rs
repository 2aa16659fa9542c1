mod config;
mod error;
mod run;

use clap::Parser;
use config::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run::run(cli).await {
        tracing::error!(error = %e, "data service failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
