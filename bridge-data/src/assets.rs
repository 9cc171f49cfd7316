//! Asset catalog
//!
//! Maps rollup asset ids to token metadata and translates plain ids into the
//! descriptor shape bridge contracts take. Asset id 0 is always ETH; every
//! other id resolves to an ERC20 through the catalog.

use ethers::types::H160;
use std::collections::HashMap;
use tracing::debug;

use crate::{
    error::{BridgeDataError, Result},
    rollup_provider::RollupStatus,
    types::{BridgeAsset, BridgeAssetType},
};

/// Metadata for a single rollup asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    /// Rollup asset id
    pub id: u32,

    /// Token symbol
    pub symbol: String,

    /// Token contract address (zero for ETH)
    pub address: H160,

    /// Token decimals
    pub decimals: u8,
}

/// Catalog of assets known to the rollup
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    assets: HashMap<u32, AssetInfo>,
}

impl AssetCatalog {
    /// Create a catalog from a list of assets
    pub fn new(assets: Vec<AssetInfo>) -> Self {
        Self {
            assets: assets.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    /// Built-in testnet asset set
    ///
    /// Used when the rollup provider is unreachable; ids and addresses match
    /// the current testnet deployment.
    pub fn testnet() -> Self {
        let assets = vec![
            AssetInfo {
                id: 0,
                symbol: "ETH".to_string(),
                address: H160::zero(),
                decimals: 18,
            },
            AssetInfo {
                id: 1,
                symbol: "DAI".to_string(),
                address: "0x6B175474E89094C44Da98b954EedeAC495271d0F".parse().unwrap(),
                decimals: 18,
            },
            AssetInfo {
                id: 2,
                symbol: "wstETH".to_string(),
                address: "0x7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0".parse().unwrap(),
                decimals: 18,
            },
            AssetInfo {
                id: 3,
                symbol: "yvDAI".to_string(),
                address: "0xdA816459F1AB5631232FE5e97a05BBBb94970c95".parse().unwrap(),
                decimals: 18,
            },
            AssetInfo {
                id: 4,
                symbol: "eDAI".to_string(),
                address: "0xe025E3ca2bE02316033184551D4d3Aa22024D9DC".parse().unwrap(),
                decimals: 18,
            },
        ];
        Self::new(assets)
    }

    /// Build a catalog from a rollup provider status document
    pub fn from_rollup_status(status: &RollupStatus) -> Result<Self> {
        let mut assets = Vec::with_capacity(status.blockchain_status.assets.len());
        for (index, asset) in status.blockchain_status.assets.iter().enumerate() {
            let address = asset
                .address
                .parse::<H160>()
                .map_err(|_| BridgeDataError::InvalidAddress(asset.address.clone()))?;
            assets.push(AssetInfo {
                id: index as u32,
                symbol: asset.symbol.clone(),
                address,
                decimals: asset.decimals,
            });
        }
        debug!(asset_count = assets.len(), "Built asset catalog from rollup status");
        Ok(Self::new(assets))
    }

    /// Get metadata for an asset id
    pub fn get(&self, id: u32) -> Result<&AssetInfo> {
        self.assets.get(&id).ok_or(BridgeDataError::UnknownAsset(id))
    }

    /// Number of assets in the catalog
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Translate a plain asset id into a bridge asset descriptor
    ///
    /// `None` stands for an absent leg and maps to the unused sentinel.
    pub fn bridge_asset(&self, id: Option<u32>) -> Result<BridgeAsset> {
        let id = match id {
            Some(id) => id,
            None => return Ok(BridgeAsset::unused()),
        };
        let info = self.get(id)?;
        let asset_type = if id == 0 {
            BridgeAssetType::Eth
        } else {
            BridgeAssetType::Erc20
        };
        Ok(BridgeAsset {
            id,
            asset_type,
            erc20_address: info.address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_leg_maps_to_unused_sentinel() {
        let catalog = AssetCatalog::testnet();
        let asset = catalog.bridge_asset(None).unwrap();
        assert_eq!(asset, BridgeAsset::unused());
    }

    #[test]
    fn test_asset_zero_is_eth() {
        let catalog = AssetCatalog::testnet();
        let asset = catalog.bridge_asset(Some(0)).unwrap();
        assert_eq!(asset.asset_type, BridgeAssetType::Eth);
        assert_eq!(asset.erc20_address, H160::zero());
    }

    #[test]
    fn test_erc20_translation_carries_catalog_address() {
        let catalog = AssetCatalog::testnet();
        let asset = catalog.bridge_asset(Some(1)).unwrap();
        assert_eq!(asset.asset_type, BridgeAssetType::Erc20);
        assert_eq!(asset.erc20_address, catalog.get(1).unwrap().address);
    }

    #[test]
    fn test_unknown_asset_id_fails() {
        let catalog = AssetCatalog::testnet();
        let result = catalog.bridge_asset(Some(99));
        assert!(matches!(result, Err(BridgeDataError::UnknownAsset(99))));
    }
}
