//! Routing configuration

use serde::{Deserialize, Serialize};

use crate::{BlockNumber, ChainId, ConfigError};

/// Largest split degree the optimizer implements
pub const MAX_SUPPORTED_SPLITS: usize = 3;

/// Limits for each candidate-pool heuristic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSelectionConfig {
    /// Top pools overall by liquidity
    pub top_n: usize,
    /// Pools directly connecting token in and token out
    pub top_n_direct_swaps: usize,
    /// Pools touching token in, and separately token out
    pub top_n_token_in_out: usize,
    /// Pools reached from the other side of each token in/out pool
    pub top_n_second_hop: usize,
    /// Per base token, pools pairing it with token in (resp. out)
    pub top_n_with_each_base_token: usize,
    /// Cap on the merged base token selection
    pub top_n_with_base_token: usize,
    /// Add base token selections to the dedup set before later heuristics run
    pub top_n_with_base_token_in_set: bool,
}

impl Default for PoolSelectionConfig {
    fn default() -> Self {
        Self {
            top_n: 2,
            top_n_direct_swaps: 2,
            top_n_token_in_out: 3,
            top_n_second_hop: 1,
            top_n_with_each_base_token: 3,
            top_n_with_base_token: 5,
            top_n_with_base_token_in_set: false,
        }
    }
}

/// Tunables for one routing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub pool_selection: PoolSelectionConfig,

    /// Max pools in a single path
    pub max_swaps_per_path: usize,

    /// Max routes in a split. The optimizer implements up to 3.
    pub max_splits: usize,

    /// Step between percent buckets; must divide 100
    pub distribution_percent: u8,

    /// Pin every provider call to this block
    pub block_number: Option<BlockNumber>,

    /// How many top split combinations to keep for diagnostics
    pub split_diagnostics_top_k: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            pool_selection: PoolSelectionConfig::default(),
            max_swaps_per_path: 3,
            max_splits: MAX_SUPPORTED_SPLITS,
            distribution_percent: 5,
            block_number: None,
            split_diagnostics_top_k: 5,
        }
    }
}

impl RoutingConfig {
    /// Chain-tuned defaults.
    ///
    /// Rollups quote fewer buckets per path; each quote there is a separate
    /// eth_call and the extra precision rarely pays for itself.
    pub fn for_chain(chain: ChainId) -> Self {
        match chain {
            ChainId::Mainnet | ChainId::Polygon => Self::default(),
            ChainId::Optimism | ChainId::Arbitrum => Self {
                pool_selection: PoolSelectionConfig {
                    top_n_token_in_out: 2,
                    top_n_with_base_token: 3,
                    ..PoolSelectionConfig::default()
                },
                distribution_percent: 10,
                ..Self::default()
            },
        }
    }

    /// Reject malformed tunables before any provider is called
    pub fn validate(&self) -> Result<(), ConfigError> {
        let percent = self.distribution_percent;
        if percent == 0 || percent > 100 || 100 % percent != 0 {
            return Err(ConfigError::InvalidDistributionPercent { percent });
        }
        if self.max_swaps_per_path == 0 {
            return Err(ConfigError::ZeroMaxHops);
        }
        if self.max_splits == 0 {
            return Err(ConfigError::ZeroMaxSplits);
        }
        if self.split_diagnostics_top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "split_diagnostics_top_k",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RoutingConfig::default();
        assert_eq!(config.distribution_percent, 5);
        assert_eq!(config.max_splits, 3);
        assert_eq!(config.max_swaps_per_path, 3);
        assert_eq!(config.pool_selection.top_n_direct_swaps, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_l2_config() {
        let config = RoutingConfig::for_chain(ChainId::Arbitrum);
        assert_eq!(config.distribution_percent, 10);
        assert_eq!(config.pool_selection.top_n_with_base_token, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_distribution_percent() {
        for bad in [0u8, 7, 30, 101] {
            let config = RoutingConfig {
                distribution_percent: bad,
                ..RoutingConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidDistributionPercent { percent }) if percent == bad
            ));
        }
        for good in [1u8, 5, 25, 50, 100] {
            let config = RoutingConfig {
                distribution_percent: good,
                ..RoutingConfig::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_validate_limits() {
        let config = RoutingConfig {
            max_swaps_per_path: 0,
            ..RoutingConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroMaxHops)));

        let config = RoutingConfig {
            max_splits: 0,
            ..RoutingConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroMaxSplits)));
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{"distribution_percent": 10, "pool_selection": {"top_n": 4}}"#;
        let parsed: RoutingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.distribution_percent, 10);
        assert_eq!(parsed.pool_selection.top_n, 4);
        assert_eq!(parsed.pool_selection.top_n_second_hop, 1);
        assert_eq!(parsed.max_splits, 3);
    }
}
