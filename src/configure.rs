use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Only "mock" is wired in this build; a real adapter slots in here
    pub mode: String,
    /// Mock mode: verify unknown payment ids as paid
    pub auto_verify: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
    pub data_dir: String,
    pub currency: String,
    pub currency_decimals: u32,
    pub gateway: GatewayConfig,
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    let s = Config::builder()
        // Set defaults
        .set_default("listen_addr", "0.0.0.0:8086")?
        .set_default("log_level", "info")?
        .set_default("log_to_file", false)?
        .set_default("log_file", "log/wallet_ledger.log")?
        .set_default("data_dir", "data/wallet")?
        .set_default("currency", "INR")?
        .set_default("currency_decimals", 2_i64)?
        .set_default("gateway.mode", "mock")?
        .set_default("gateway.auto_verify", true)?
        // Add configuration from a file
        .add_source(File::with_name("config/config.yaml").required(false))
        // Add configuration from environment variables
        .add_source(config::Environment::with_prefix("WALLET").separator("__"))
        .build()?;

    s.try_deserialize()
}
