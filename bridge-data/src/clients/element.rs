//! Element bridge client
//!
//! Fixed-yield tranches. The bridge keeps a pool registry keyed by the hash
//! of (underlying asset, expiry); quoting swaps the input for the tranche
//! token through the Balancer vault without executing.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{H160, H256, U256};
use tracing::debug;

use crate::{
    clients::BridgeClient,
    contracts::{
        int256_magnitude, interaction_hash, BridgeAbi, BALANCER_VAULT_ABI, ELEMENT_BRIDGE_ABI,
    },
    error::{BridgeDataError, Result},
    rpc::EthereumRpc,
    types::BridgeAsset,
};

const NAME: &str = "element";

// Balancer SwapKind.GIVEN_IN
const SWAP_GIVEN_IN: u64 = 0;

/// Client for the Element fixed-yield bridge
pub struct ElementClient {
    rpc: EthereumRpc,
    bridge: H160,
    balancer: H160,
    rollup: H160,
}

impl ElementClient {
    /// Create a client over the deployed bridge and the Balancer vault
    pub fn create(rpc: EthereumRpc, bridge: H160, balancer: H160, rollup: H160) -> Self {
        Self {
            rpc,
            bridge,
            balancer,
            rollup,
        }
    }

    /// Look up the tranche pool for an asset and expiry
    async fn pool_for(&self, asset: H160, expiry: u64) -> Result<(H160, H256)> {
        let key = interaction_hash(asset, expiry);
        let data = BridgeAbi::encode_call(
            &ELEMENT_BRIDGE_ABI,
            "ElementBridge",
            "pools",
            &[Token::Uint(key)],
        )?;
        let output = self.rpc.call(self.bridge, data).await?;
        let tokens =
            BridgeAbi::decode_output(&ELEMENT_BRIDGE_ABI, "ElementBridge", "pools", &output)?;
        match tokens.as_slice() {
            [Token::Address(tranche), Token::Address(_pool), Token::FixedBytes(pool_id)]
                if pool_id.len() == 32 =>
            {
                if tranche.is_zero() {
                    return Err(BridgeDataError::quote(
                        NAME.to_string(),
                        format!("no pool registered for asset {:?} at expiry {}", asset, expiry),
                    ));
                }
                Ok((*tranche, H256::from_slice(pool_id)))
            }
            _ => Err(BridgeDataError::abi("ElementBridge", "unexpected pools output")),
        }
    }

    /// Dry-run the input -> tranche swap through the Balancer vault
    async fn query_swap(
        &self,
        pool_id: H256,
        token_in: H160,
        token_out: H160,
        amount: U256,
    ) -> Result<U256> {
        let swaps = Token::Array(vec![Token::Tuple(vec![
            Token::FixedBytes(pool_id.as_bytes().to_vec()),
            Token::Uint(U256::zero()),
            Token::Uint(U256::one()),
            Token::Uint(amount),
            Token::Bytes(Vec::new()),
        ])]);
        let assets = Token::Array(vec![Token::Address(token_in), Token::Address(token_out)]);
        let funds = Token::Tuple(vec![
            Token::Address(self.rollup),
            Token::Bool(false),
            Token::Address(self.rollup),
            Token::Bool(false),
        ]);

        let data = BridgeAbi::encode_call(
            &BALANCER_VAULT_ABI,
            "BalancerVault",
            "queryBatchSwap",
            &[Token::Uint(U256::from(SWAP_GIVEN_IN)), swaps, assets, funds],
        )?;
        let output = self.rpc.call(self.balancer, data).await?;
        let tokens = BridgeAbi::decode_output(
            &BALANCER_VAULT_ABI,
            "BalancerVault",
            "queryBatchSwap",
            &output,
        )?;

        let deltas = match tokens.as_slice() {
            [Token::Array(deltas)] if deltas.len() == 2 => deltas.clone(),
            _ => return Err(BridgeDataError::abi("BalancerVault", "unexpected queryBatchSwap output")),
        };
        let raw_out = match &deltas[1] {
            Token::Int(value) => *value,
            _ => return Err(BridgeDataError::abi("BalancerVault", "unexpected delta type")),
        };

        // Amounts leaving the vault are reported as negative deltas
        let (magnitude, negative) = int256_magnitude(raw_out);
        if !negative {
            return Err(BridgeDataError::quote(NAME, "pool returned no output for swap"));
        }
        Ok(magnitude)
    }
}

#[async_trait]
impl BridgeClient for ElementClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn expected_output(
        &self,
        input_a: BridgeAsset,
        input_b: BridgeAsset,
        _output_a: BridgeAsset,
        output_b: BridgeAsset,
        aux_data: u64,
        input_value: U256,
    ) -> Result<Vec<U256>> {
        if input_b.is_used() || output_b.is_used() {
            return Err(BridgeDataError::quote(NAME, "bridge has single-asset legs"));
        }

        let (tranche, pool_id) = self.pool_for(input_a.erc20_address, aux_data).await?;
        let output = self
            .query_swap(pool_id, input_a.erc20_address, tranche, input_value)
            .await?;

        debug!(
            input = %input_value,
            output = %output,
            expiry = aux_data,
            tranche = %tranche,
            "Quoted Element tranche entry"
        );
        Ok(vec![output])
    }

    async fn aux_data_options(&self, input_a: BridgeAsset) -> Result<Vec<u64>> {
        let data = BridgeAbi::encode_call(
            &ELEMENT_BRIDGE_ABI,
            "ElementBridge",
            "getAssetExpiries",
            &[Token::Address(input_a.erc20_address)],
        )?;
        let output = self.rpc.call(self.bridge, data).await?;
        let tokens = BridgeAbi::decode_output(
            &ELEMENT_BRIDGE_ABI,
            "ElementBridge",
            "getAssetExpiries",
            &output,
        )?;
        match tokens.as_slice() {
            [Token::Array(expiries)] => expiries
                .iter()
                .map(|token| match token {
                    Token::Uint(value) => Ok(value.as_u64()),
                    _ => Err(BridgeDataError::abi("ElementBridge", "unexpected expiry type")),
                })
                .collect(),
            _ => Err(BridgeDataError::abi("ElementBridge", "unexpected getAssetExpiries output")),
        }
    }
}
