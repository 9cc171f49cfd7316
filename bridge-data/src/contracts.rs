//! Contract ABIs and call encoding
//!
//! ABI definitions for the contracts the bridge clients quote against, plus
//! helper functions for encoding calls and decoding outputs via RPC.

use ethers::abi::{Abi, Token};
use ethers::types::{Bytes, H160, U256};
use ethers::utils::keccak256;
use once_cell::sync::Lazy;
use serde_json::json;

use crate::error::{BridgeDataError, Result};

/// Seconds in a calendar year, for annualizing oracle report deltas
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// On-chain data provider ABI (bridge and rollup lookups)
pub static DATA_PROVIDER_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "inputs": [],
            "name": "getRollupAddress",
            "outputs": [{"internalType": "address", "name": "", "type": "address"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "getBridges",
            "outputs": [{
                "internalType": "struct DataProvider.BridgeData[]",
                "name": "",
                "type": "tuple[]",
                "components": [
                    {"internalType": "address", "name": "bridgeAddress", "type": "address"},
                    {"internalType": "uint256", "name": "bridgeAddressId", "type": "uint256"},
                    {"internalType": "string", "name": "label", "type": "string"}
                ]
            }],
            "stateMutability": "view",
            "type": "function"
        }
    ]))
    .expect("Valid data provider ABI")
});

/// Curve stETH/ETH pool ABI (get_dy function)
pub static CURVE_POOL_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "inputs": [
                {"internalType": "int128", "name": "i", "type": "int128"},
                {"internalType": "int128", "name": "j", "type": "int128"},
                {"internalType": "uint256", "name": "dx", "type": "uint256"}
            ],
            "name": "get_dy",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        }
    ]))
    .expect("Valid Curve pool ABI")
});

/// wstETH wrapper ABI (stETH conversion functions)
pub static WSTETH_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "inputs": [{"internalType": "uint256", "name": "_stETHAmount", "type": "uint256"}],
            "name": "getWstETHByStETH",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "uint256", "name": "_wstETHAmount", "type": "uint256"}],
            "name": "getStETHByWstETH",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        }
    ]))
    .expect("Valid wstETH ABI")
});

/// Lido oracle ABI (last completed report delta)
pub static LIDO_ORACLE_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "inputs": [],
            "name": "getLastCompletedReportDelta",
            "outputs": [
                {"internalType": "uint256", "name": "postTotalPooledEther", "type": "uint256"},
                {"internalType": "uint256", "name": "preTotalPooledEther", "type": "uint256"},
                {"internalType": "uint256", "name": "timeElapsed", "type": "uint256"}
            ],
            "stateMutability": "view",
            "type": "function"
        }
    ]))
    .expect("Valid Lido oracle ABI")
});

/// Euler eToken ABI (balance conversion functions)
pub static ETOKEN_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "inputs": [{"internalType": "uint256", "name": "underlyingAmount", "type": "uint256"}],
            "name": "convertUnderlyingToBalance",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "uint256", "name": "balance", "type": "uint256"}],
            "name": "convertBalanceToUnderlying",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        }
    ]))
    .expect("Valid eToken ABI")
});

/// Yearn vault ABI (share price and decimals)
pub static YEARN_VAULT_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "inputs": [],
            "name": "pricePerShare",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "decimals",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        }
    ]))
    .expect("Valid Yearn vault ABI")
});

/// Element bridge ABI (pool registry and expiry lookups)
pub static ELEMENT_BRIDGE_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "inputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "name": "pools",
            "outputs": [
                {"internalType": "address", "name": "trancheAddress", "type": "address"},
                {"internalType": "address", "name": "poolAddress", "type": "address"},
                {"internalType": "bytes32", "name": "poolId", "type": "bytes32"}
            ],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "address", "name": "asset", "type": "address"}],
            "name": "getAssetExpiries",
            "outputs": [{"internalType": "uint64[]", "name": "", "type": "uint64[]"}],
            "stateMutability": "view",
            "type": "function"
        }
    ]))
    .expect("Valid Element bridge ABI")
});

/// Balancer vault ABI (queryBatchSwap)
pub static BALANCER_VAULT_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "inputs": [
                {"internalType": "uint8", "name": "kind", "type": "uint8"},
                {
                    "internalType": "struct IVault.BatchSwapStep[]",
                    "name": "swaps",
                    "type": "tuple[]",
                    "components": [
                        {"internalType": "bytes32", "name": "poolId", "type": "bytes32"},
                        {"internalType": "uint256", "name": "assetInIndex", "type": "uint256"},
                        {"internalType": "uint256", "name": "assetOutIndex", "type": "uint256"},
                        {"internalType": "uint256", "name": "amount", "type": "uint256"},
                        {"internalType": "bytes", "name": "userData", "type": "bytes"}
                    ]
                },
                {"internalType": "address[]", "name": "assets", "type": "address[]"},
                {
                    "internalType": "struct IVault.FundManagement",
                    "name": "funds",
                    "type": "tuple",
                    "components": [
                        {"internalType": "address", "name": "sender", "type": "address"},
                        {"internalType": "bool", "name": "fromInternalBalance", "type": "bool"},
                        {"internalType": "address", "name": "recipient", "type": "address"},
                        {"internalType": "bool", "name": "toInternalBalance", "type": "bool"}
                    ]
                }
            ],
            "name": "queryBatchSwap",
            "outputs": [{"internalType": "int256[]", "name": "", "type": "int256[]"}],
            "stateMutability": "nonpayable",
            "type": "function"
        }
    ]))
    .expect("Valid Balancer vault ABI")
});

/// DCA bridge ABI (oracle price)
pub static DCA_BRIDGE_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_value(json!([
        {
            "inputs": [],
            "name": "getPrice",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        }
    ]))
    .expect("Valid DCA bridge ABI")
});

/// Helper for encoding contract calls and decoding their outputs
pub struct BridgeAbi;

impl BridgeAbi {
    /// Encode a function call
    pub fn encode_call(
        abi: &Abi,
        contract: &str,
        function_name: &str,
        params: &[Token],
    ) -> Result<Bytes> {
        let function = abi.function(function_name).map_err(|e| {
            BridgeDataError::abi(
                contract.to_string(),
                format!("function {} not found: {}", function_name, e),
            )
        })?;

        let encoded = function.encode_input(params).map_err(|e| {
            BridgeDataError::abi(
                contract.to_string(),
                format!("failed to encode {}: {}", function_name, e),
            )
        })?;

        Ok(Bytes::from(encoded))
    }

    /// Decode function output
    pub fn decode_output(
        abi: &Abi,
        contract: &str,
        function_name: &str,
        output: &[u8],
    ) -> Result<Vec<Token>> {
        let function = abi.function(function_name).map_err(|e| {
            BridgeDataError::abi(
                contract.to_string(),
                format!("function {} not found: {}", function_name, e),
            )
        })?;

        let decoded = function.decode_output(output).map_err(|e| {
            BridgeDataError::abi(
                contract.to_string(),
                format!("failed to decode {}: {}", function_name, e),
            )
        })?;

        Ok(decoded)
    }

    /// Decode an output consisting of a single uint256
    pub fn decode_single_uint(
        abi: &Abi,
        contract: &str,
        function_name: &str,
        output: &[u8],
    ) -> Result<U256> {
        let tokens = Self::decode_output(abi, contract, function_name, output)?;
        match tokens.as_slice() {
            [Token::Uint(value)] => Ok(*value),
            _ => Err(BridgeDataError::abi(
                contract.to_string(),
                format!("unexpected output shape for {}", function_name),
            )),
        }
    }
}

/// Interaction hash keying the element bridge's pool registry
///
/// Matches the bridge contract's keccak over the ABI-encoded asset address
/// and expiry.
pub fn interaction_hash(asset: H160, expiry: u64) -> U256 {
    let encoded = ethers::abi::encode(&[Token::Address(asset), Token::Uint(U256::from(expiry))]);
    U256::from_big_endian(&keccak256(encoded))
}

/// Split a raw int256 word into magnitude and sign
pub fn int256_magnitude(value: U256) -> (U256, bool) {
    if value.bit(255) {
        ((!value).overflowing_add(U256::one()).0, true)
    } else {
        (value, false)
    }
}

/// Annualized staking rate from a Lido oracle report delta, in percent
pub fn lido_staking_apr(post: U256, pre: U256, time_elapsed: U256) -> Result<f64> {
    if pre.is_zero() || time_elapsed.is_zero() {
        return Err(BridgeDataError::abi(
            "LidoOracle",
            "report delta has zero base or elapsed time",
        ));
    }
    if post < pre {
        return Ok(0.0);
    }
    let gain = (post - pre).as_u128() as f64 / pre.as_u128() as f64;
    let periods_per_year = SECONDS_PER_YEAR as f64 / time_elapsed.as_u128() as f64;
    Ok(gain * periods_per_year * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_dy_selector() {
        let data = BridgeAbi::encode_call(
            &CURVE_POOL_ABI,
            "CurvePool",
            "get_dy",
            &[
                Token::Int(U256::zero()),
                Token::Int(U256::one()),
                Token::Uint(U256::exp10(18)),
            ],
        )
        .unwrap();
        // Canonical selector for get_dy(int128,int128,uint256)
        assert_eq!(&data[0..4], &[0x5e, 0x0d, 0x44, 0x3f]);
        assert_eq!(data.len(), 4 + 3 * 32);
    }

    #[test]
    fn test_decode_single_uint_output() {
        let mut output = [0u8; 32];
        U256::from(1_040_000_000_000_000_000u64).to_big_endian(&mut output);
        let value =
            BridgeAbi::decode_single_uint(&YEARN_VAULT_ABI, "YearnVault", "pricePerShare", &output)
                .unwrap();
        assert_eq!(value, U256::from(1_040_000_000_000_000_000u64));
    }

    #[test]
    fn test_decode_batch_swap_deltas() {
        // Hand-built int256[] return: offset word, length 2, +1000, -500
        let mut output = Vec::new();
        let mut word = [0u8; 32];
        U256::from(32u64).to_big_endian(&mut word);
        output.extend_from_slice(&word);
        U256::from(2u64).to_big_endian(&mut word);
        output.extend_from_slice(&word);
        U256::from(1000u64).to_big_endian(&mut word);
        output.extend_from_slice(&word);
        let minus_500 = (!U256::from(500u64)).overflowing_add(U256::one()).0;
        minus_500.to_big_endian(&mut word);
        output.extend_from_slice(&word);

        let tokens = BridgeAbi::decode_output(
            &BALANCER_VAULT_ABI,
            "BalancerVault",
            "queryBatchSwap",
            &output,
        )
        .unwrap();
        let deltas = match &tokens[0] {
            Token::Array(items) => items.clone(),
            other => panic!("unexpected token: {:?}", other),
        };
        assert_eq!(deltas.len(), 2);
        let raw_out = match &deltas[1] {
            Token::Int(value) => *value,
            other => panic!("unexpected token: {:?}", other),
        };
        let (magnitude, negative) = int256_magnitude(raw_out);
        assert!(negative);
        assert_eq!(magnitude, U256::from(500u64));
    }

    #[test]
    fn test_interaction_hash_is_expiry_sensitive() {
        let asset: H160 = "0x6B175474E89094C44Da98b954EedeAC495271d0F".parse().unwrap();
        let a = interaction_hash(asset, 1_663_361_092);
        let b = interaction_hash(asset, 1_677_243_924);
        assert_ne!(a, b);
        assert_eq!(a, interaction_hash(asset, 1_663_361_092));
    }

    #[test]
    fn test_lido_staking_apr_annualizes_report_delta() {
        // One day of reports, one basis point of growth
        let pre = U256::exp10(24);
        let post = pre + U256::exp10(20);
        let apr = lido_staking_apr(post, pre, U256::from(86_400u64)).unwrap();
        assert!((apr - 3.65).abs() < 1e-9);
    }

    #[test]
    fn test_lido_staking_apr_rejects_zero_elapsed() {
        let result = lido_staking_apr(U256::one(), U256::one(), U256::zero());
        assert!(result.is_err());
    }
}
