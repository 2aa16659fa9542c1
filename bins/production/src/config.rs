use clap::Parser;
use sidecar_client::{BrokerArgs, SidecarArgs};

#[derive(Parser, Debug)]
#[command(name = "production", about = "Publishes synthetic \"product created\" events")]
pub struct Cli {
    #[command(flatten)]
    pub sidecar: SidecarArgs,

    #[command(flatten)]
    pub broker: BrokerArgs,

    /// Seconds between two events
    #[arg(long, default_value_t = 5, env = "INTERVAL_SECS")]
    pub interval_secs: u64,

    /// Product ids are drawn from 1..=max
    #[arg(long, default_value_t = 2, env = "MAX_PRODUCT_ID")]
    pub max_product_id: i64,

    /// Seed for a reproducible event sequence
    #[arg(long, env = "PRODUCER_SEED")]
    pub seed: Option<u64>,

    /// CloudEvents `source` attribute
    #[arg(long, default_value = "production", env = "EVENT_SOURCE")]
    pub source: String,
}
