//! Bridge quote clients
//!
//! One client per supported bridge, each answering "what would this input
//! amount yield" against the live contracts. Clients are constructed by the
//! registry and shared behind `Arc<dyn BridgeClient>`.

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::types::{H160, U256};

use crate::{
    contracts::BridgeAbi,
    error::{BridgeDataError, Result},
    rpc::EthereumRpc,
    types::BridgeAsset,
};

pub mod curve_steth;
pub mod dca;
pub mod element;
pub mod euler;
pub mod yearn;

pub use curve_steth::CurveStethClient;
pub use dca::DcaClient;
pub use element::ElementClient;
pub use euler::EulerClient;
pub use yearn::YearnClient;

/// Quote interface over a single bridge
///
/// `expected_output` is the one required operation. The discovery operations
/// have defaults that fail with a capability error; clients opt in where the
/// underlying protocol can answer them.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Bridge name this client answers for
    fn name(&self) -> &'static str;

    /// Whether this client can compute expected outputs
    fn supports_expected_output(&self) -> bool {
        true
    }

    /// Predicted output amount(s) for an input amount, without executing
    ///
    /// Returns one magnitude for single-output bridges, two when the bridge
    /// fills both output legs.
    async fn expected_output(
        &self,
        input_a: BridgeAsset,
        input_b: BridgeAsset,
        output_a: BridgeAsset,
        output_b: BridgeAsset,
        aux_data: u64,
        input_value: U256,
    ) -> Result<Vec<U256>>;

    /// Valid aux-data values for an input asset (e.g. tranche expiries)
    async fn aux_data_options(&self, _input_a: BridgeAsset) -> Result<Vec<u64>> {
        Err(BridgeDataError::capability(self.name(), "aux_data_options"))
    }

    /// Current yearly rate for a yield-bearing asset, in percent
    async fn apr(&self, _yield_asset: BridgeAsset) -> Result<f64> {
        Err(BridgeDataError::capability(self.name(), "apr"))
    }
}

/// Call a view function returning a single uint256
pub(crate) async fn call_single_uint(
    rpc: &EthereumRpc,
    to: H160,
    abi: &Abi,
    contract: &str,
    function: &str,
    params: &[Token],
) -> Result<U256> {
    let data = BridgeAbi::encode_call(abi, contract, function, params)?;
    let output = rpc.call(to, data).await?;
    BridgeAbi::decode_single_uint(abi, contract, function, &output)
}
