//! Error types for the quoter

use thiserror::Error;
use veil_bridge_data::BridgeDataError;

/// Result type alias for quoter operations
pub type Result<T> = std::result::Result<T, QuoterError>;

/// Error types for quoter operations
#[derive(Error, Debug)]
pub enum QuoterError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Bridge data error: {0}")]
    BridgeData(#[from] BridgeDataError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timed out after {seconds}s waiting for a quote")]
    Timeout { seconds: u64 },

    #[error("Quote failed: {0}")]
    Query(QueryError),
}

/// Failure kind published in the query state
///
/// Configuration failures need operator attention, capability failures mean
/// the bridge cannot answer the request at all, and transient failures are
/// worth retrying on the next input change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    Configuration,
    Capability,
    Transient,
}

/// Failure descriptor published in the query state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub message: String,
}

impl QueryError {
    /// Create a transient error
    pub fn transient<S: Into<String>>(message: S) -> Self {
        Self {
            kind: QueryErrorKind::Transient,
            message: message.into(),
        }
    }
}

impl From<&BridgeDataError> for QueryError {
    fn from(err: &BridgeDataError) -> Self {
        let kind = match err {
            BridgeDataError::UnknownBridge(_)
            | BridgeDataError::Configuration { .. }
            | BridgeDataError::UnknownAsset(_)
            | BridgeDataError::InvalidAddress(_) => QueryErrorKind::Configuration,
            BridgeDataError::Capability { .. } => QueryErrorKind::Capability,
            _ => QueryErrorKind::Transient,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_failures_map_to_configuration() {
        let err = BridgeDataError::configuration("dca", "no deployment registered");
        assert_eq!(QueryError::from(&err).kind, QueryErrorKind::Configuration);

        let err = BridgeDataError::UnknownAsset(42);
        assert_eq!(QueryError::from(&err).kind, QueryErrorKind::Configuration);
    }

    #[test]
    fn test_capability_failures_keep_their_kind() {
        let err = BridgeDataError::capability("yearn", "apr");
        assert_eq!(QueryError::from(&err).kind, QueryErrorKind::Capability);
    }

    #[test]
    fn test_quote_failures_are_transient() {
        let err = BridgeDataError::quote("element", "pool returned no output");
        assert_eq!(QueryError::from(&err).kind, QueryErrorKind::Transient);
    }
}
