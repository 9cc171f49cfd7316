//! On-chain data provider client
//!
//! One-time fetch of the rollup contract address and the registered bridge
//! deployments. Both lookups are issued concurrently; the resulting snapshot
//! is fixed for the lifetime of the client registry built from it.

use std::collections::HashMap;

use ethers::abi::Token;
use ethers::types::H160;
use futures::try_join;
use tracing::info;

use crate::{
    contracts::{BridgeAbi, DATA_PROVIDER_ABI},
    error::{BridgeDataError, Result},
    rpc::EthereumRpc,
    types::{BridgeDataSnapshot, BridgeDeployment},
};

const CONTRACT: &str = "DataProvider";

/// Client for the on-chain data provider contract
#[derive(Debug, Clone)]
pub struct DataProviderClient {
    rpc: EthereumRpc,
    address: H160,
}

impl DataProviderClient {
    /// Create a client for the data provider at the given address
    pub fn new(rpc: EthereumRpc, address: H160) -> Self {
        Self { rpc, address }
    }

    /// Fetch the rollup processor contract address
    pub async fn fetch_rollup_address(&self) -> Result<H160> {
        let data = BridgeAbi::encode_call(&DATA_PROVIDER_ABI, CONTRACT, "getRollupAddress", &[])?;
        let output = self.rpc.call(self.address, data).await?;
        let tokens =
            BridgeAbi::decode_output(&DATA_PROVIDER_ABI, CONTRACT, "getRollupAddress", &output)?;
        match tokens.as_slice() {
            [Token::Address(address)] => Ok(*address),
            _ => Err(BridgeDataError::abi(CONTRACT, "unexpected getRollupAddress output")),
        }
    }

    /// Fetch the registered bridges, keyed by deployment label
    pub async fn fetch_bridges(&self) -> Result<HashMap<String, BridgeDeployment>> {
        let data = BridgeAbi::encode_call(&DATA_PROVIDER_ABI, CONTRACT, "getBridges", &[])?;
        let output = self.rpc.call(self.address, data).await?;
        let tokens = BridgeAbi::decode_output(&DATA_PROVIDER_ABI, CONTRACT, "getBridges", &output)?;

        let entries = match tokens.as_slice() {
            [Token::Array(entries)] => entries.clone(),
            _ => return Err(BridgeDataError::abi(CONTRACT, "unexpected getBridges output")),
        };

        let mut bridges = HashMap::with_capacity(entries.len());
        for entry in entries {
            let fields = match entry {
                Token::Tuple(fields) => fields,
                _ => return Err(BridgeDataError::abi(CONTRACT, "bridge entry is not a tuple")),
            };
            match fields.as_slice() {
                [Token::Address(address), Token::Uint(address_id), Token::String(label)] => {
                    bridges.insert(
                        label.clone(),
                        BridgeDeployment {
                            address: *address,
                            address_id: address_id.as_u64(),
                            label: label.clone(),
                        },
                    );
                }
                _ => return Err(BridgeDataError::abi(CONTRACT, "unexpected bridge entry shape")),
            }
        }
        Ok(bridges)
    }

    /// Fetch the full snapshot the client registry is built from
    pub async fn fetch_snapshot(&self) -> Result<BridgeDataSnapshot> {
        let (rollup_address, bridges) =
            try_join!(self.fetch_rollup_address(), self.fetch_bridges())?;

        info!(
            rollup = %rollup_address,
            bridge_count = bridges.len(),
            "Fetched bridge data snapshot"
        );

        Ok(BridgeDataSnapshot {
            rollup_address,
            bridges,
        })
    }
}
