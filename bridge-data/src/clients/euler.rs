//! Euler bridge client
//!
//! Lending positions are quoted through the market's eToken: deposits
//! convert underlying to eToken balance, withdrawals the reverse. The staked
//! ETH market additionally answers APR queries through the Lido oracle.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{H160, U256};
use tracing::debug;

use crate::{
    clients::{call_single_uint, BridgeClient},
    contracts::{lido_staking_apr, BridgeAbi, ETOKEN_ABI, LIDO_ORACLE_ABI},
    error::{BridgeDataError, Result},
    rpc::EthereumRpc,
    types::{BridgeAsset, BridgeAssetType},
};

const NAME: &str = "euler";

// Aux data selects the operation on the lending bridge
const AUX_DEPOSIT: u64 = 0;
const AUX_WITHDRAW: u64 = 1;

/// Client for the Euler lending bridge
pub struct EulerClient {
    rpc: EthereumRpc,
    lido_oracle: Option<H160>,
}

impl EulerClient {
    /// Create a client without staked-ETH market support
    pub fn create(rpc: EthereumRpc) -> Self {
        Self {
            rpc,
            lido_oracle: None,
        }
    }

    /// Create a client that can also answer staked-ETH market APR queries
    pub fn create_with_lido(rpc: EthereumRpc, lido_oracle: H160) -> Self {
        Self {
            rpc,
            lido_oracle: Some(lido_oracle),
        }
    }

    fn erc20_address(asset: BridgeAsset) -> Result<H160> {
        if asset.asset_type != BridgeAssetType::Erc20 {
            return Err(BridgeDataError::quote(NAME, "markets are entered through ERC20 assets"));
        }
        Ok(asset.erc20_address)
    }
}

#[async_trait]
impl BridgeClient for EulerClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn expected_output(
        &self,
        input_a: BridgeAsset,
        input_b: BridgeAsset,
        output_a: BridgeAsset,
        output_b: BridgeAsset,
        aux_data: u64,
        input_value: U256,
    ) -> Result<Vec<U256>> {
        if input_b.is_used() || output_b.is_used() {
            return Err(BridgeDataError::quote(NAME, "bridge has single-asset legs"));
        }

        let output = match aux_data {
            AUX_DEPOSIT => {
                let etoken = Self::erc20_address(output_a)?;
                call_single_uint(
                    &self.rpc,
                    etoken,
                    &ETOKEN_ABI,
                    "EToken",
                    "convertUnderlyingToBalance",
                    &[Token::Uint(input_value)],
                )
                .await?
            }
            AUX_WITHDRAW => {
                let etoken = Self::erc20_address(input_a)?;
                call_single_uint(
                    &self.rpc,
                    etoken,
                    &ETOKEN_ABI,
                    "EToken",
                    "convertBalanceToUnderlying",
                    &[Token::Uint(input_value)],
                )
                .await?
            }
            other => {
                return Err(BridgeDataError::quote(
                    NAME.to_string(),
                    format!("unsupported aux data {}", other),
                ));
            }
        };

        debug!(
            input = %input_value,
            output = %output,
            operation = if aux_data == AUX_DEPOSIT { "deposit" } else { "withdraw" },
            "Quoted Euler conversion"
        );
        Ok(vec![output])
    }

    async fn apr(&self, _yield_asset: BridgeAsset) -> Result<f64> {
        let oracle = match self.lido_oracle {
            Some(oracle) => oracle,
            None => return Err(BridgeDataError::capability(NAME, "apr")),
        };
        let data = BridgeAbi::encode_call(
            &LIDO_ORACLE_ABI,
            "LidoOracle",
            "getLastCompletedReportDelta",
            &[],
        )?;
        let output = self.rpc.call(oracle, data).await?;
        let tokens = BridgeAbi::decode_output(
            &LIDO_ORACLE_ABI,
            "LidoOracle",
            "getLastCompletedReportDelta",
            &output,
        )?;
        match tokens.as_slice() {
            [Token::Uint(post), Token::Uint(pre), Token::Uint(elapsed)] => {
                lido_staking_apr(*post, *pre, *elapsed)
            }
            _ => Err(BridgeDataError::abi("LidoOracle", "unexpected report delta shape")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_apr_without_oracle_is_a_capability_error() {
        let rpc = EthereumRpc::connect("http://localhost:8545").unwrap();
        let client = EulerClient::create(rpc);
        let result = client
            .apr(BridgeAsset {
                id: 2,
                asset_type: BridgeAssetType::Erc20,
                erc20_address: H160::zero(),
            })
            .await;
        assert!(matches!(result, Err(BridgeDataError::Capability { .. })));
    }
}
