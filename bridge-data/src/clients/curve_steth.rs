//! Curve stETH bridge client
//!
//! Quotes the ETH <-> wstETH conversion: the curve pool prices the ETH/stETH
//! swap, the wstETH wrapper converts between stETH and its non-rebasing
//! share representation.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{H160, U256};
use tracing::debug;

use crate::{
    clients::{call_single_uint, BridgeClient},
    contracts::{lido_staking_apr, BridgeAbi, CURVE_POOL_ABI, LIDO_ORACLE_ABI, WSTETH_ABI},
    error::{BridgeDataError, Result},
    rpc::EthereumRpc,
    types::{BridgeAsset, BridgeAssetType},
};

const NAME: &str = "curve-lido";

// Pool coin indices in the curve ETH/stETH pool
const ETH_INDEX: u64 = 0;
const STETH_INDEX: u64 = 1;

/// Client for the Curve stETH bridge
pub struct CurveStethClient {
    rpc: EthereumRpc,
    wsteth: H160,
    lido_oracle: H160,
    curve_pool: H160,
}

impl CurveStethClient {
    /// Create a client over the given pool and wrapper deployments
    pub fn create(rpc: EthereumRpc, wsteth: H160, lido_oracle: H160, curve_pool: H160) -> Self {
        Self {
            rpc,
            wsteth,
            lido_oracle,
            curve_pool,
        }
    }

    async fn get_dy(&self, i: u64, j: u64, dx: U256) -> Result<U256> {
        call_single_uint(
            &self.rpc,
            self.curve_pool,
            &CURVE_POOL_ABI,
            "CurvePool",
            "get_dy",
            &[
                Token::Int(U256::from(i)),
                Token::Int(U256::from(j)),
                Token::Uint(dx),
            ],
        )
        .await
    }

    async fn wsteth_by_steth(&self, steth: U256) -> Result<U256> {
        call_single_uint(
            &self.rpc,
            self.wsteth,
            &WSTETH_ABI,
            "WstETH",
            "getWstETHByStETH",
            &[Token::Uint(steth)],
        )
        .await
    }

    async fn steth_by_wsteth(&self, wsteth: U256) -> Result<U256> {
        call_single_uint(
            &self.rpc,
            self.wsteth,
            &WSTETH_ABI,
            "WstETH",
            "getStETHByWstETH",
            &[Token::Uint(wsteth)],
        )
        .await
    }
}

#[async_trait]
impl BridgeClient for CurveStethClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn expected_output(
        &self,
        input_a: BridgeAsset,
        input_b: BridgeAsset,
        _output_a: BridgeAsset,
        output_b: BridgeAsset,
        _aux_data: u64,
        input_value: U256,
    ) -> Result<Vec<U256>> {
        if input_b.is_used() || output_b.is_used() {
            return Err(BridgeDataError::quote(NAME, "bridge has single-asset legs"));
        }

        let output = if input_a.asset_type == BridgeAssetType::Eth {
            let steth = self.get_dy(ETH_INDEX, STETH_INDEX, input_value).await?;
            self.wsteth_by_steth(steth).await?
        } else {
            let steth = self.steth_by_wsteth(input_value).await?;
            self.get_dy(STETH_INDEX, ETH_INDEX, steth).await?
        };

        debug!(input = %input_value, output = %output, "Quoted curve stETH conversion");
        Ok(vec![output])
    }

    async fn apr(&self, _yield_asset: BridgeAsset) -> Result<f64> {
        let data = BridgeAbi::encode_call(
            &LIDO_ORACLE_ABI,
            "LidoOracle",
            "getLastCompletedReportDelta",
            &[],
        )?;
        let output = self.rpc.call(self.lido_oracle, data).await?;
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
