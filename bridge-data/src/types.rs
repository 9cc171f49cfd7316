//! Core data types shared between the data provider, the client registry,
//! and the quoting layer.

use ethers::types::{H160, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An amount of a specific rollup asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetValue {
    /// Rollup asset id
    pub asset_id: u32,

    /// Amount in the asset's smallest unit
    pub value: U256,
}

/// How a bridge leg interprets an asset slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeAssetType {
    Eth,
    Erc20,
    Virtual,
    NotUsed,
}

/// Asset descriptor in the shape bridge contracts expect
///
/// Distinct from the plain numeric asset id used elsewhere on the rollup:
/// bridges need the type tag and the token contract address as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeAsset {
    /// Rollup asset id
    pub id: u32,

    /// Type tag for the bridge leg
    pub asset_type: BridgeAssetType,

    /// Token contract address (zero for ETH and unused slots)
    pub erc20_address: H160,
}

impl BridgeAsset {
    /// Sentinel standing in for an absent second leg
    pub fn unused() -> Self {
        Self {
            id: 0,
            asset_type: BridgeAssetType::NotUsed,
            erc20_address: H160::zero(),
        }
    }

    /// Whether this slot carries a real asset
    pub fn is_used(&self) -> bool {
        self.asset_type != BridgeAssetType::NotUsed
    }
}

/// A bridge registered with the on-chain data provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeDeployment {
    /// Deployed bridge contract address
    pub address: H160,

    /// Rollup-assigned bridge address id
    pub address_id: u64,

    /// Human-readable deployment label, e.g. "ElementBridge"
    pub label: String,
}

/// Shared inputs for the client registry, fetched once from the data provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeDataSnapshot {
    /// Rollup processor contract address
    pub rollup_address: H160,

    /// Registered bridges keyed by deployment label
    pub bridges: HashMap<String, BridgeDeployment>,
}
