//! Error types for Waypoint

use thiserror::Error;

/// Errors that abort a routing call
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Split search was asked for a degree it does not implement.
    /// This is a configuration defect, never a market condition.
    #[error("Split search beyond 3 routes is not supported (requested {splits})")]
    UnsupportedSplitDegree { splits: usize },
}

/// Malformed tunables or inputs, raised before any search work
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Distribution percent {percent} must be in 1..=100 and divide 100 evenly")]
    InvalidDistributionPercent { percent: u8 },

    #[error("max_swaps_per_path must be at least 1")]
    ZeroMaxHops,

    #[error("max_splits must be at least 1")]
    ZeroMaxSplits,

    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failures reported by an external collaborator.
///
/// The router never retries; these propagate to the caller as-is.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Pool universe unavailable: {message}")]
    PoolUniverse { message: String },

    #[error("Token resolution failed: {message}")]
    TokenResolution { message: String },

    #[error("Pool state unavailable: {message}")]
    PoolState { message: String },

    #[error("Quote batch failed: {message}")]
    Quote { message: String },

    #[error("Gas price unavailable: {message}")]
    GasPrice { message: String },

    #[error("Gas model unavailable: {message}")]
    GasModel { message: String },
}

/// Reason a raw quote was dropped before optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidQuote {
    #[error("quote amount missing")]
    MissingAmount,

    #[error("sqrt price list missing")]
    MissingSqrtPrices,

    #[error("initialized ticks crossed list missing")]
    MissingTicksCrossed,

    #[error("gas estimate missing")]
    MissingGasEstimate,
}

impl RoutingError {
    /// Stable identifier for callers and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Provider(e) => e.error_code(),
            Self::UnsupportedSplitDegree { .. } => "unsupported_split_degree",
        }
    }

    /// Whether retrying the same request later can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDistributionPercent { .. } => "invalid_distribution_percent",
            Self::ZeroMaxHops => "zero_max_hops",
            Self::ZeroMaxSplits => "zero_max_splits",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::Invalid { .. } => "invalid_config",
        }
    }
}

impl ProviderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PoolUniverse { .. } => "pool_universe_unavailable",
            Self::TokenResolution { .. } => "token_resolution_failed",
            Self::PoolState { .. } => "pool_state_unavailable",
            Self::Quote { .. } => "quote_failed",
            Self::GasPrice { .. } => "gas_price_unavailable",
            Self::GasModel { .. } => "gas_model_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = RoutingError::from(ConfigError::InvalidDistributionPercent { percent: 7 });
        assert_eq!(err.error_code(), "invalid_distribution_percent");
        assert!(!err.is_retryable());

        let err = RoutingError::from(ProviderError::Quote {
            message: "rpc timeout".into(),
        });
        assert_eq!(err.error_code(), "quote_failed");
        assert!(err.is_retryable());

        let err = RoutingError::UnsupportedSplitDegree { splits: 4 };
        assert_eq!(err.error_code(), "unsupported_split_degree");
    }

    #[test]
    fn test_provider_error_display_is_preserved() {
        let err = RoutingError::from(ProviderError::PoolState {
            message: "multicall reverted".into(),
        });
        assert_eq!(
            err.to_string(),
            "Provider error: Pool state unavailable: multicall reverted"
        );
    }
}
