//! Rollup provider HTTP client
//!
//! Fetches the rollup provider's status document, which carries the asset
//! listing the catalog is built from and the registered bridge ids.

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Result;

/// Rollup provider status document (relevant subset)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupStatus {
    pub blockchain_status: BlockchainStatus,
}

/// Blockchain section of the status document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainStatus {
    #[serde(default)]
    pub assets: Vec<StatusAsset>,

    #[serde(default)]
    pub bridges: Vec<StatusBridge>,
}

/// Asset entry as reported by the rollup provider
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusAsset {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Bridge entry as reported by the rollup provider
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBridge {
    pub id: u64,
    pub address: String,
}

/// HTTP client for the rollup provider
#[derive(Debug, Clone)]
pub struct RollupProviderClient {
    http: reqwest::Client,
    base_url: String,
}

impl RollupProviderClient {
    /// Create a client for the given base URL
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the current status document
    pub async fn status(&self) -> Result<RollupStatus> {
        let url = format!("{}/status", self.base_url);
        debug!(url = %url, "Fetching rollup provider status");

        let response = self.http.get(&url).send().await?.error_for_status()?;
        let status: RollupStatus = response.json().await?;

        info!(
            asset_count = status.blockchain_status.assets.len(),
            bridge_count = status.blockchain_status.bridges.len(),
            "Fetched rollup provider status"
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_document_parsing() {
        let raw = serde_json::json!({
            "blockchainStatus": {
                "assets": [
                    {"address": "0x0000000000000000000000000000000000000000", "symbol": "ETH", "decimals": 18},
                    {"address": "0x6b175474e89094c44da98b954eedeac495271d0f", "symbol": "DAI", "decimals": 18}
                ],
                "bridges": [
                    {"id": 1, "address": "0xaed181779a8aabd8ce996949853fea442c2cdb47"}
                ]
            }
        });
        let status: RollupStatus = serde_json::from_value(raw).unwrap();
        assert_eq!(status.blockchain_status.assets.len(), 2);
        assert_eq!(status.blockchain_status.assets[1].symbol, "DAI");
        assert_eq!(status.blockchain_status.bridges[0].id, 1);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = RollupProviderClient::new("https://api.example.com/falafel/");
        assert_eq!(client.base_url, "https://api.example.com/falafel");
    }
}
