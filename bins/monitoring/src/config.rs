use clap::Parser;
use prodmon_pipeline::AnchorPolicy;
use sidecar_client::{BrokerArgs, SidecarArgs};

#[derive(Parser, Debug)]
#[command(name = "monitoring", about = "Checks production events against ERP target times")]
pub struct Cli {
    #[command(flatten)]
    pub sidecar: SidecarArgs,

    #[command(flatten)]
    pub broker: BrokerArgs,

    #[arg(long, default_value_t = 1325, env = "APP_PORT")]
    pub port: u16,

    #[arg(long, default_value = "0.0.0.0", env = "APP_BIND")]
    pub bind: String,

    /// App id of the master-data service, reached through service invocation
    #[arg(long, default_value = "erp", env = "ERP_APP_ID")]
    pub erp_app_id: String,

    /// Day the target time is placed on: `today` or `event-date`
    #[arg(long, default_value_t = AnchorPolicy::Today, env = "ANCHOR_POLICY")]
    pub anchor: AnchorPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["monitoring"]);
        assert_eq!(cli.port, 1325);
        assert_eq!(cli.erp_app_id, "erp");
        assert_eq!(cli.anchor, AnchorPolicy::Today);
    }

    #[test]
    fn anchor_policy_is_parsed() {
        let cli = Cli::parse_from(["monitoring", "--anchor", "event-date"]);
        assert_eq!(cli.anchor, AnchorPolicy::EventDate);
        assert!(Cli::try_parse_from(["monitoring", "--anchor", "tomorrow"]).is_err());
    }
}
