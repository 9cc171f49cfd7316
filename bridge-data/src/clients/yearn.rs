//! Yearn bridge client
//!
//! Vault entries and exits priced off the vault's share price: deposits
//! receive shares, withdrawals receive underlying.

use async_trait::async_trait;
use ethers::types::{H160, U256};
use tracing::debug;

use crate::{
    clients::{call_single_uint, BridgeClient},
    contracts::YEARN_VAULT_ABI,
    error::{BridgeDataError, Result},
    rpc::EthereumRpc,
    types::{BridgeAsset, BridgeAssetType},
};

const NAME: &str = "yearn";

// Aux data selects the vault operation
const AUX_DEPOSIT: u64 = 0;
const AUX_WITHDRAW: u64 = 1;

/// Client for the Yearn vault bridge
pub struct YearnClient {
    rpc: EthereumRpc,
}

impl YearnClient {
    /// Create a client
    pub fn create(rpc: EthereumRpc) -> Self {
        Self { rpc }
    }

    fn vault_address(asset: BridgeAsset) -> Result<H160> {
        if asset.asset_type != BridgeAssetType::Erc20 {
            return Err(BridgeDataError::quote(NAME, "vault shares are ERC20 assets"));
        }
        Ok(asset.erc20_address)
    }

    async fn share_price(&self, vault: H160) -> Result<(U256, U256)> {
        let price = call_single_uint(
            &self.rpc,
            vault,
            &YEARN_VAULT_ABI,
            "YearnVault",
            "pricePerShare",
            &[],
        )
        .await?;
        let decimals = call_single_uint(
            &self.rpc,
            vault,
            &YEARN_VAULT_ABI,
            "YearnVault",
            "decimals",
            &[],
        )
        .await?;
        Ok((price, U256::exp10(decimals.as_usize())))
    }
}

/// Shares received for an underlying deposit
fn to_shares(amount: U256, price_per_share: U256, unit: U256) -> Result<U256> {
    if price_per_share.is_zero() {
        return Err(BridgeDataError::quote(NAME, "vault reported zero share price"));
    }
    amount
        .checked_mul(unit)
        .map(|v| v / price_per_share)
        .ok_or_else(|| BridgeDataError::quote(NAME, "share conversion overflow"))
}

/// Underlying received for a share withdrawal
fn to_underlying(shares: U256, price_per_share: U256, unit: U256) -> Result<U256> {
    if unit.is_zero() {
        return Err(BridgeDataError::quote(NAME, "vault reported zero decimals unit"));
    }
    shares
        .checked_mul(price_per_share)
        .map(|v| v / unit)
        .ok_or_else(|| BridgeDataError::quote(NAME, "share conversion overflow"))
}

#[async_trait]
impl BridgeClient for YearnClient {
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
                let vault = Self::vault_address(output_a)?;
                let (price, unit) = self.share_price(vault).await?;
                to_shares(input_value, price, unit)?
            }
            AUX_WITHDRAW => {
                let vault = Self::vault_address(input_a)?;
                let (price, unit) = self.share_price(vault).await?;
                to_underlying(input_value, price, unit)?
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
            "Quoted Yearn conversion"
        );
        Ok(vec![output])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_discounts_by_share_price() {
        // Share price 1.04 on an 18-decimal vault
        let price = U256::from(1_040_000_000_000_000_000u64);
        let unit = U256::exp10(18);
        let shares = to_shares(U256::exp10(18) * U256::from(104u64), price, unit).unwrap();
        assert_eq!(shares, U256::exp10(18) * U256::from(100u64));
    }

    #[test]
    fn test_withdraw_round_trips_deposit() {
        let price = U256::from(1_040_000_000_000_000_000u64);
        let unit = U256::exp10(18);
        let amount = U256::exp10(18) * U256::from(104u64);
        let shares = to_shares(amount, price, unit).unwrap();
        assert_eq!(to_underlying(shares, price, unit).unwrap(), amount);
    }

    #[test]
    fn test_zero_share_price_fails() {
        let result = to_shares(U256::exp10(18), U256::zero(), U256::exp10(18));
        assert!(matches!(result, Err(BridgeDataError::Quote { .. })));
    }
}
