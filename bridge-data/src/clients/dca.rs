//! DCA bridge client
//!
//! The bidirectional DCA bridge trades ETH against DAI at its oracle price.
//! A quote is a straight conversion at the current price; the tick window in
//! the aux data shapes execution, not pricing.

use async_trait::async_trait;
use ethers::types::{H160, U256};
use tracing::debug;

use crate::{
    clients::{call_single_uint, BridgeClient},
    contracts::DCA_BRIDGE_ABI,
    error::{BridgeDataError, Result},
    rpc::EthereumRpc,
    types::{BridgeAsset, BridgeAssetType},
};

const NAME: &str = "dca";

/// Client for the DCA bridge
pub struct DcaClient {
    rpc: EthereumRpc,
    bridge: H160,
}

impl DcaClient {
    /// Create a client over the deployed DCA bridge
    pub fn create(rpc: EthereumRpc, bridge: H160) -> Self {
        Self { rpc, bridge }
    }

    async fn oracle_price(&self) -> Result<U256> {
        call_single_uint(
            &self.rpc,
            self.bridge,
            &DCA_BRIDGE_ABI,
            "DcaBridge",
            "getPrice",
            &[],
        )
        .await
    }
}

/// Convert an input amount at a 1e18-scaled DAI-per-ETH price
fn convert_at_price(input_value: U256, price: U256, eth_in: bool) -> Result<U256> {
    if price.is_zero() {
        return Err(BridgeDataError::quote(NAME, "oracle reported zero price"));
    }
    let scale = U256::exp10(18);
    if eth_in {
        input_value
            .checked_mul(price)
            .map(|v| v / scale)
            .ok_or_else(|| BridgeDataError::quote(NAME, "price conversion overflow"))
    } else {
        input_value
            .checked_mul(scale)
            .map(|v| v / price)
            .ok_or_else(|| BridgeDataError::quote(NAME, "price conversion overflow"))
    }
}

#[async_trait]
impl BridgeClient for DcaClient {
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

        let price = self.oracle_price().await?;
        let eth_in = input_a.asset_type == BridgeAssetType::Eth;
        let output = convert_at_price(input_value, price, eth_in)?;

        debug!(
            input = %input_value,
            output = %output,
            price = %price,
            ticks = aux_data,
            "Quoted DCA conversion"
        );
        Ok(vec![output])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eth_in_multiplies_by_price() {
        // 2 ETH at 1500 DAI/ETH
        let price = U256::exp10(18) * U256::from(1500u64);
        let out = convert_at_price(U256::exp10(18) * U256::from(2u64), price, true).unwrap();
        assert_eq!(out, U256::exp10(18) * U256::from(3000u64));
    }

    #[test]
    fn test_dai_in_divides_by_price() {
        let price = U256::exp10(18) * U256::from(1500u64);
        let out = convert_at_price(U256::exp10(18) * U256::from(3000u64), price, false).unwrap();
        assert_eq!(out, U256::exp10(18) * U256::from(2u64));
    }

    #[test]
    fn test_zero_price_fails() {
        let result = convert_at_price(U256::exp10(18), U256::zero(), true);
        assert!(matches!(result, Err(BridgeDataError::Quote { .. })));
    }
}
