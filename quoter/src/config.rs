//! Configuration management for the quoter

use config::{Config, ConfigError, Environment, File};
use ethers::types::H160;
use serde::{Deserialize, Serialize};
use url::Url;

/// Main configuration structure for the quoter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoterConfig {
    /// Global settings
    pub global: GlobalConfig,

    /// Ethereum RPC settings
    pub rpc: RpcConfig,

    /// Rollup deployment settings
    pub rollup: RollupConfig,

    /// Metrics settings
    pub metrics: MetricsConfig,
}

/// Global quoter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Log level
    pub log_level: String,
}

/// Ethereum RPC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// HTTP RPC URL
    pub http_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Rollup deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupConfig {
    /// On-chain data provider contract address
    pub data_provider_address: String,

    /// Rollup provider base URL (asset catalog source)
    pub falafel_url: String,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus listener
    pub enabled: bool,

    /// Prometheus bind address
    pub bind_address: String,

    /// Prometheus port
    pub port: u16,
}

impl QuoterConfig {
    /// Load configuration from files and environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with built-in defaults
            .add_source(Config::try_from(&QuoterConfig::default())?)
            .add_source(File::with_name("config/quoter").required(false))
            // Add environment-specific config
            .add_source(
                File::with_name(&format!(
                    "config/quoter-{}",
                    std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/quoter-local").required(false))
            // Add environment variables with VEIL_ prefix
            .add_source(Environment::with_prefix("VEIL").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if Url::parse(&self.rpc.http_url).is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid RPC URL: {}",
                self.rpc.http_url
            )));
        }

        if Url::parse(&self.rollup.falafel_url).is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid rollup provider URL: {}",
                self.rollup.falafel_url
            )));
        }

        self.data_provider_address()?;

        if self.rpc.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "timeout_seconds must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Parsed data provider address
    pub fn data_provider_address(&self) -> std::result::Result<H160, ConfigError> {
        self.rollup.data_provider_address.parse::<H160>().map_err(|_| {
            ConfigError::Message(format!(
                "Invalid data provider address: {}",
                self.rollup.data_provider_address
            ))
        })
    }
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig {
                log_level: "info".to_string(),
            },
            rpc: RpcConfig {
                http_url: "https://aztec-connect-testnet-eth-host.aztec.network:8545".to_string(),
                timeout_seconds: 30,
            },
            rollup: RollupConfig {
                // Current testnet deployment
                data_provider_address: "0x525B43BE6c67d10C73Ca06d790B329820A1967b7".to_string(),
                falafel_url: "https://api.aztec.network/aztec-connect-testnet/falafel".to_string(),
            },
            metrics: MetricsConfig {
                enabled: false,
                bind_address: "0.0.0.0".to_string(),
                port: 9100,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = QuoterConfig::default();
        config.validate().unwrap();
        config.data_provider_address().unwrap();
    }

    #[test]
    fn test_bad_rpc_url_fails_validation() {
        let mut config = QuoterConfig::default();
        config.rpc.http_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_data_provider_address_fails_validation() {
        let mut config = QuoterConfig::default();
        config.rollup.data_provider_address = "0x123".to_string();
        assert!(config.validate().is_err());
    }
}
