//! # Veil Bridge Data
//!
//! Data layer for quoting conversions through the Veil rollup's external
//! bridges. Fetches bridge deployments from the on-chain data provider,
//! constructs one quote client per bridge on first use, and exposes the
//! clients behind a uniform async interface.
//!
//! ## Consumers:
//! - **quoter**: drives expected-output queries against the client registry

pub mod assets;
pub mod clients;
pub mod contracts;
pub mod data_provider;
pub mod error;
pub mod registry;
pub mod rollup_provider;
pub mod rpc;
pub mod types;

pub use assets::{AssetCatalog, AssetInfo};
pub use clients::BridgeClient;
pub use data_provider::DataProviderClient;
pub use error::{BridgeDataError, Result};
pub use registry::{BridgeClientRegistry, BridgeClientSource};
pub use rollup_provider::RollupProviderClient;
pub use rpc::EthereumRpc;
pub use types::{AssetValue, BridgeAsset, BridgeAssetType, BridgeDataSnapshot, BridgeDeployment};

/// Current version of the bridge data layer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Supported bridge integrations
///
/// The set is closed at build time: each variant has a registered factory in
/// the client registry, and parsing an unknown name fails rather than
/// producing an unconfigured entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BridgeClientName {
    #[serde(rename = "curve-lido")]
    CurveLido,
    #[serde(rename = "dca")]
    Dca,
    #[serde(rename = "euler")]
    Euler,
    #[serde(rename = "element")]
    Element,
    #[serde(rename = "yearn")]
    Yearn,
}

impl BridgeClientName {
    /// Get the bridge name as a string
    pub fn name(&self) -> &'static str {
        match self {
            BridgeClientName::CurveLido => "curve-lido",
            BridgeClientName::Dca => "dca",
            BridgeClientName::Euler => "euler",
            BridgeClientName::Element => "element",
            BridgeClientName::Yearn => "yearn",
        }
    }

    /// All supported bridge names
    pub fn all() -> [BridgeClientName; 5] {
        [
            BridgeClientName::CurveLido,
            BridgeClientName::Dca,
            BridgeClientName::Euler,
            BridgeClientName::Element,
            BridgeClientName::Yearn,
        ]
    }
}

impl std::fmt::Display for BridgeClientName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for BridgeClientName {
    type Err = BridgeDataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "curve-lido" | "curve_lido" => Ok(BridgeClientName::CurveLido),
            "dca" => Ok(BridgeClientName::Dca),
            "euler" => Ok(BridgeClientName::Euler),
            "element" => Ok(BridgeClientName::Element),
            "yearn" => Ok(BridgeClientName::Yearn),
            _ => Err(BridgeDataError::UnknownBridge(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_name_round_trip() {
        for name in BridgeClientName::all() {
            let parsed: BridgeClientName = name.name().parse().unwrap();
            assert_eq!(parsed, name);
        }
    }

    #[test]
    fn test_unknown_bridge_name_fails() {
        let result = "uniswap".parse::<BridgeClientName>();
        assert!(matches!(result, Err(BridgeDataError::UnknownBridge(_))));
    }
}
