use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub commission: CommissionConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    /// PostgreSQL connection URL; absent means the in-memory dev store
    #[serde(default)]
    pub postgres_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Rates applied to orders created while this config is live; existing
/// orders keep the rate frozen at their creation time
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommissionConfig {
    pub customer_commission_percent: Decimal,
    pub cashback_percent: Decimal,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            customer_commission_percent: Decimal::new(5, 0),
            cashback_percent: Decimal::new(15, 1),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminConfig {
    /// Balance the clearing account is bootstrapped with on first run
    pub seed_balance: Decimal,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            seed_balance: Decimal::ZERO,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}
