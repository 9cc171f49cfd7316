//! Error types for the bridge data layer

use thiserror::Error;

/// Result type alias for bridge data operations
pub type Result<T> = std::result::Result<T, BridgeDataError>;

/// Error types for bridge data operations
#[derive(Error, Debug)]
pub enum BridgeDataError {
    #[error("Unknown bridge: {0}")]
    UnknownBridge(String),

    #[error("Configuration error for bridge {bridge}: {message}")]
    Configuration { bridge: String, message: String },

    #[error("Bridge {bridge} does not support {operation}")]
    Capability { bridge: String, operation: String },

    #[error("Unknown asset id: {0}")]
    UnknownAsset(u32),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("ABI error for {contract}: {message}")]
    Abi { contract: String, message: String },

    #[error("Ethereum client error: {0}")]
    Rpc(#[from] ethers::providers::ProviderError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Quote failed on bridge {bridge}: {message}")]
    Quote { bridge: String, message: String },
}

impl BridgeDataError {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(bridge: S, message: S) -> Self {
        Self::Configuration {
            bridge: bridge.into(),
            message: message.into(),
        }
    }

    /// Create a new capability error
    pub fn capability<S: Into<String>>(bridge: S, operation: S) -> Self {
        Self::Capability {
            bridge: bridge.into(),
            operation: operation.into(),
        }
    }

    /// Create a new ABI error
    pub fn abi<S: Into<String>>(contract: S, message: S) -> Self {
        Self::Abi {
            contract: contract.into(),
            message: message.into(),
        }
    }

    /// Create a new quote error
    pub fn quote<S: Into<String>>(bridge: S, message: S) -> Self {
        Self::Quote {
            bridge: bridge.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeDataError::Rpc(_) | BridgeDataError::Network(_) | BridgeDataError::Quote { .. }
        )
    }

    /// Get the error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            BridgeDataError::UnknownBridge(_) => "configuration",
            BridgeDataError::Configuration { .. } => "configuration",
            BridgeDataError::Capability { .. } => "capability",
            BridgeDataError::UnknownAsset(_) => "configuration",
            BridgeDataError::InvalidAddress(_) => "configuration",
            BridgeDataError::Abi { .. } => "abi",
            BridgeDataError::Rpc(_) => "rpc",
            BridgeDataError::Network(_) => "network",
            BridgeDataError::Serialization(_) => "serialization",
            BridgeDataError::Quote { .. } => "quote",
        }
    }
}
