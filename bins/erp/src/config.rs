use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "erp", about = "Serves product master data")]
pub struct Cli {
    #[arg(long, default_value_t = 1323, env = "APP_PORT")]
    pub port: u16,

    #[arg(long, default_value = "0.0.0.0", env = "APP_BIND")]
    pub bind: String,

    /// TOML file with `[[products]]` entries; built-in catalog when absent
    #[arg(long, env = "CATALOG_PATH")]
    pub catalog: Option<String>,
}
