//! Split Router
//!
//! Orchestrates one routing call: curation and gas price in parallel, path
//! enumeration, batched quoting, gas adjustment, split search and assembly.

use num_bigint::BigUint;
use std::sync::Arc;
use waypoint_core::{ChainId, RoutingConfig, RoutingError, Token, TradeType};

use crate::assemble::{assemble_swap_route, emit_pool_selection_metrics};
use crate::curation::get_candidate_pools;
use crate::distribution::amount_distribution;
use crate::paths::compute_all_routes;
use crate::providers::{GasModel, PoolAccessor, RouterProviders};
use crate::split::best_swap_route;
use crate::state::{RawQuote, Route, SwapRoute, ValidatedRouteQuote};

/// Router bound to one chain and one set of providers. Holds no per-call
/// state, so it can serve concurrent calls.
#[derive(Clone)]
pub struct SplitRouter {
    chain: ChainId,
    providers: RouterProviders,
}

impl SplitRouter {
    pub fn new(chain: ChainId, providers: RouterProviders) -> Self {
        Self { chain, providers }
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Route `amount` of `amount_token`.
    ///
    /// For exact input, `amount_token` is sold for `quote_token`; for exact
    /// output, `amount` of `amount_token` is bought with `quote_token`.
    /// Returns `Ok(None)` when no route exists.
    pub async fn route(
        &self,
        amount: &BigUint,
        amount_token: &Token,
        quote_token: &Token,
        trade_type: TradeType,
        config: &RoutingConfig,
    ) -> Result<Option<SwapRoute>, RoutingError> {
        config.validate()?;

        let (token_in, token_out) = match trade_type {
            TradeType::ExactInput => (amount_token, quote_token),
            TradeType::ExactOutput => (quote_token, amount_token),
        };
        tracing::info!(
            "Routing {} {} of {} -> {} on {}",
            trade_type,
            amount,
            token_in,
            token_out,
            self.chain
        );

        // ------- Step 1: candidate pools and gas price -------
        let (gas_price_wei, candidates) = futures::try_join!(
            self.providers.gas_price.gas_price_wei(),
            get_candidate_pools(token_in, token_out, trade_type, config, &self.providers),
        )?;
        let pools = candidates.accessor.all_pools();

        // ------- Step 2: paths -------
        let routes = compute_all_routes(token_in, token_out, &pools, config.max_swaps_per_path);
        if routes.is_empty() {
            tracing::info!(
                "No path from {} to {} within {} hops",
                token_in,
                token_out,
                config.max_swaps_per_path
            );
            return Ok(None);
        }

        // ------- Step 3: quotes for every route and fraction -------
        let distribution = amount_distribution(amount, config.distribution_percent)?;
        let batch = self
            .providers
            .quoter
            .get_quotes(&distribution.amounts, &routes, trade_type, config.block_number)
            .await?;

        // ------- Step 4: gas adjustment -------
        let gas_model = self
            .providers
            .gas_model_factory
            .build(
                self.chain,
                &gas_price_wei,
                Arc::clone(&candidates.accessor),
                quote_token,
            )
            .await?;
        let quotes = validate_quotes(
            batch.routes_with_quotes,
            &distribution.percents,
            trade_type,
            gas_model.as_ref(),
            candidates.accessor.as_ref(),
        );

        // ------- Step 5: split search -------
        let Some(plan) = best_swap_route(&distribution.percents, quotes, trade_type, config)? else {
            return Ok(None);
        };

        // ------- Step 6: assemble -------
        let swap = assemble_swap_route(plan, amount, trade_type, gas_price_wei, batch.block_number);
        emit_pool_selection_metrics(&swap, &candidates.selections);
        tracing::info!(
            "Routed over {} legs at block {}: quote {} (gas adjusted {})",
            swap.route.len(),
            swap.block_number,
            swap.quote,
            swap.quote_gas_adjusted
        );

        Ok(Some(swap))
    }
}

/// Pair each raw quote with its percent and fold in gas. Incomplete quotes
/// are dropped.
fn validate_quotes(
    routes_with_quotes: Vec<(Route, Vec<RawQuote>)>,
    percents: &[u8],
    trade_type: TradeType,
    gas_model: &dyn GasModel,
    accessor: &dyn PoolAccessor,
) -> Vec<ValidatedRouteQuote> {
    let mut validated = Vec::new();
    let mut dropped = 0usize;

    for (route, quotes) in routes_with_quotes {
        for (raw, percent) in quotes.into_iter().zip(percents) {
            match raw.validate(&route, *percent) {
                Ok(quote) => {
                    validated.push(ValidatedRouteQuote::new(quote, trade_type, gas_model, accessor))
                }
                Err(reason) => {
                    dropped += 1;
                    tracing::debug!("Dropping {}% quote on {}: {}", percent, route, reason);
                }
            }
        }
    }

    tracing::debug!(
        "Validated {} quotes, dropped {}",
        validated.len(),
        dropped
    );
    validated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants;
    use crate::memory::{
        FixedGasPrice, HopGasModelFactory, LocalQuoter, MemoryPoolUniverse, SimulatedPoolState,
        StaticTokenList,
    };
    use crate::providers::PoolUniverseSource;
    use crate::state::{q96, PoolSummary, TradablePool};
    use async_trait::async_trait;
    use num_bigint::BigInt;
    use std::collections::HashSet;
    use waypoint_core::{Address, BlockNumber, ConfigError, FeeAmount, ProviderError};

    fn make_token(n: u8, symbol: &str) -> Token {
        let addr = format!("0x{:02x}{}", n, "0".repeat(38));
        Token::new(ChainId::Mainnet, Address::parse(&addr).unwrap(), symbol, 18)
    }

    fn unit_pool(a: &Token, b: &Token, fee: FeeAmount, liquidity: u64) -> TradablePool {
        TradablePool::new(a.clone(), b.clone(), fee, q96(), BigUint::from(liquidity))
    }

    fn summarize(pool: &TradablePool) -> PoolSummary {
        PoolSummary {
            id: pool.address(),
            token0: pool.token0.address.clone(),
            token1: pool.token1.address.clone(),
            fee_tier: pool.fee.fee_tier(),
            tvl_usd: 1_000.0,
        }
    }

    fn make_router(pools: Vec<TradablePool>, tokens: Vec<Token>) -> SplitRouter {
        let universe = pools.iter().map(summarize).collect();
        SplitRouter::new(
            ChainId::Mainnet,
            RouterProviders {
                pool_universe: Arc::new(MemoryPoolUniverse::new(universe)),
                blocklist: None,
                token_resolver: Arc::new(StaticTokenList::new(tokens)),
                pool_state: Arc::new(SimulatedPoolState::new(pools)),
                quoter: Arc::new(LocalQuoter::new(100)),
                gas_price: Arc::new(FixedGasPrice::new(BigUint::from(1_000_000_000u64))),
                gas_model_factory: Arc::new(HopGasModelFactory::default()),
            },
        )
    }

    fn assert_valid(swap: &SwapRoute, amount: &BigUint) {
        let sum: BigUint = swap.route.iter().map(|r| &r.amount).sum();
        assert_eq!(&sum, amount);
        let percents: u32 = swap.route.iter().map(|r| u32::from(r.percent)).sum();
        assert_eq!(percents, 100);
        let pools: Vec<_> = swap.pool_addresses().collect();
        let unique: HashSet<_> = pools.iter().collect();
        assert_eq!(pools.len(), unique.len());
    }

    #[tokio::test]
    async fn test_single_pool_route() {
        let x = make_token(1, "X");
        let y = make_token(2, "Y");
        let router = make_router(
            vec![unit_pool(&x, &y, FeeAmount::Low, 10u64.pow(15))],
            vec![x.clone(), y.clone()],
        );
        let amount = BigUint::from(1_000_000u64);

        let swap = router
            .route(&amount, &x, &y, TradeType::ExactInput, &RoutingConfig::default())
            .await
            .unwrap()
            .unwrap();

        assert_valid(&swap, &amount);
        assert_eq!(swap.route.len(), 1);
        assert_eq!(swap.block_number, 100);
        assert!(swap.quote > BigUint::from(990_000u64));
        assert_eq!(swap.estimated_gas_used, 82_000);
        // No X/WETH pool, so gas is free in X terms
        assert_eq!(swap.quote_gas_adjusted, BigInt::from(swap.quote.clone()));
    }

    #[tokio::test]
    async fn test_large_trade_splits_across_pools() {
        let x = make_token(1, "X");
        let y = make_token(2, "Y");
        let liquidity = 10u64.pow(12);
        let router = make_router(
            vec![
                unit_pool(&x, &y, FeeAmount::Lowest, liquidity),
                unit_pool(&x, &y, FeeAmount::Low, liquidity),
            ],
            vec![x.clone(), y.clone()],
        );
        let amount = BigUint::from(liquidity);

        let swap = router
            .route(&amount, &x, &y, TradeType::ExactInput, &RoutingConfig::default())
            .await
            .unwrap()
            .unwrap();

        assert_valid(&swap, &amount);
        assert_eq!(swap.route.len(), 2);
        assert!(swap.route[0].amount >= swap.route[1].amount);
    }

    #[tokio::test]
    async fn test_exact_output_route() {
        let x = make_token(1, "X");
        let y = make_token(2, "Y");
        let z = make_token(3, "Z");
        let liquidity = 10u64.pow(15);
        let router = make_router(
            vec![
                unit_pool(&x, &z, FeeAmount::Low, liquidity),
                unit_pool(&z, &y, FeeAmount::Low, liquidity),
            ],
            vec![x.clone(), y.clone(), z.clone()],
        );
        let amount = BigUint::from(5_000_000u64);

        // Buy 5e6 Y paying in X
        let swap = router
            .route(&amount, &y, &x, TradeType::ExactOutput, &RoutingConfig::default())
            .await
            .unwrap()
            .unwrap();

        assert_valid(&swap, &amount);
        assert_eq!(swap.route[0].route.token_path(), vec![x, z, y]);
        assert!(swap.quote > amount);
    }

    #[tokio::test]
    async fn test_gas_priced_in_output_token() {
        let weth = Token::new(
            ChainId::Mainnet,
            Address::parse(constants::mainnet::WETH.0).unwrap(),
            "WETH",
            18,
        );
        let x = make_token(1, "X");
        let router = make_router(
            vec![unit_pool(&x, &weth, FeeAmount::Low, 10u64.pow(18))],
            vec![x.clone(), weth.clone()],
        );
        let amount = BigUint::from(10u64.pow(16));

        let swap = router
            .route(&amount, &x, &weth, TradeType::ExactInput, &RoutingConfig::default())
            .await
            .unwrap()
            .unwrap();

        // 82000 gas at 1 gwei, output is WETH itself
        let gas_wei = BigUint::from(82_000u64 * 1_000_000_000);
        assert_eq!(swap.estimated_gas_used_quote_token, gas_wei);
        assert_eq!(
            swap.quote_gas_adjusted,
            BigInt::from(swap.quote.clone()) - BigInt::from(gas_wei)
        );
    }

    #[tokio::test]
    async fn test_disconnected_tokens_have_no_route() {
        let x = make_token(1, "X");
        let y = make_token(2, "Y");
        let z = make_token(3, "Z");
        let w = make_token(4, "W");
        let router = make_router(
            vec![
                unit_pool(&x, &z, FeeAmount::Low, 10u64.pow(15)),
                unit_pool(&w, &y, FeeAmount::Low, 10u64.pow(15)),
            ],
            vec![x.clone(), y.clone(), z, w],
        );

        let result = router
            .route(
                &BigUint::from(1_000u32),
                &x,
                &y,
                TradeType::ExactInput,
                &RoutingConfig::default(),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_drained_pool_has_no_route() {
        let x = make_token(1, "X");
        let y = make_token(2, "Y");
        let router = make_router(
            vec![unit_pool(&x, &y, FeeAmount::Low, 1_000)],
            vec![x.clone(), y.clone()],
        );

        // Asking for more Y than the pool holds invalidates every large bucket
        let result = router
            .route(
                &BigUint::from(10_000u32),
                &y,
                &x,
                TradeType::ExactOutput,
                &RoutingConfig::default(),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_first() {
        let x = make_token(1, "X");
        let y = make_token(2, "Y");
        let router = make_router(vec![], vec![]);
        let config = RoutingConfig {
            distribution_percent: 7,
            ..RoutingConfig::default()
        };

        let err = router
            .route(&BigUint::from(1u8), &x, &y, TradeType::ExactInput, &config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RoutingError::Config(ConfigError::InvalidDistributionPercent { percent: 7 })
        ));
    }

    struct UnavailableUniverse;

    #[async_trait]
    impl PoolUniverseSource for UnavailableUniverse {
        async fn get_pools(
            &self,
            _block: Option<BlockNumber>,
        ) -> Result<Vec<PoolSummary>, ProviderError> {
            Err(ProviderError::PoolUniverse {
                message: "indexer returned 503".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let x = make_token(1, "X");
        let y = make_token(2, "Y");
        let mut router = make_router(vec![], vec![]);
        router.providers.pool_universe = Arc::new(UnavailableUniverse);

        let err = router
            .route(
                &BigUint::from(1u8),
                &x,
                &y,
                TradeType::ExactInput,
                &RoutingConfig::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "pool_universe_unavailable");
        assert!(err.is_retryable());
    }
}
