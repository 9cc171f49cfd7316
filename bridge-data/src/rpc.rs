//! Ethereum RPC access
//!
//! Thin cloneable handle around a JSON-RPC provider. Passed opaquely to the
//! bridge client factories; every quote in this crate goes through `call`.

use std::sync::Arc;

use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Bytes, NameOrAddress, H160};
use tracing::debug;

use crate::error::{BridgeDataError, Result};

/// Shared Ethereum RPC handle
#[derive(Debug, Clone)]
pub struct EthereumRpc {
    provider: Arc<Provider<Http>>,
}

impl EthereumRpc {
    /// Connect to a JSON-RPC endpoint
    pub fn connect(url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|_| BridgeDataError::InvalidAddress(url.to_string()))?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    /// Wrap an existing provider
    pub fn new(provider: Provider<Http>) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Execute an eth_call against the latest block
    pub async fn call(&self, to: H160, data: Bytes) -> Result<Bytes> {
        debug!(to = %to, data_len = data.len(), "Executing eth_call");

        let mut tx = TypedTransaction::default();
        tx.set_to(NameOrAddress::Address(to));
        tx.set_data(data);

        let result = self.provider.call(&tx, None).await?;
        Ok(result)
    }

    /// Get the current block number
    pub async fn block_number(&self) -> Result<u64> {
        let block_number = self.provider.get_block_number().await?;
        Ok(block_number.as_u64())
    }
}
