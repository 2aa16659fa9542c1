use clap::{Parser, ValueEnum};
use sidecar_client::{BrokerArgs, SidecarArgs};

/// Backing store for the `products` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Output binding behind the sidecar
    Dapr,
    /// Process-local table, lost on exit
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "data", about = "Persists \"product created\" events")]
pub struct Cli {
    #[command(flatten)]
    pub sidecar: SidecarArgs,

    #[command(flatten)]
    pub broker: BrokerArgs,

    #[arg(long, default_value_t = 1324, env = "APP_PORT")]
    pub port: u16,

    #[arg(long, default_value = "0.0.0.0", env = "APP_BIND")]
    pub bind: String,

    /// Output binding name of the postgres store
    #[arg(long, default_value = "bindings-postgres", env = "BINDING_NAME")]
    pub binding: String,

    #[arg(long, value_enum, default_value_t = StoreKind::Dapr, env = "STORE")]
    pub store: StoreKind,

    /// Records returned by `GET /products`
    #[arg(long, default_value_t = 10, env = "RECENT_LIMIT")]
    pub recent_limit: usize,
}
