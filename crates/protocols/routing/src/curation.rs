//! Pool Universe Curator
//!
//! Reduces the indexed pool universe to a handful of high-signal candidates
//! before path enumeration. Selection runs several independent TVL-ranked
//! heuristics; most of them skip pools an earlier heuristic already took.

use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use waypoint_core::{
    Address, ChainId, FeeAmount, PoolSelectionConfig, ProviderError, RoutingConfig, Token,
    TradeType,
};

use crate::constants;
use crate::providers::{PoolAccessor, RouterProviders, TokenBlocklist};
use crate::state::{canonical_pool_address, PoolSummary};

/// TVL assigned to direct pools synthesized when the index has none
pub const OPTIMISTIC_POOL_TVL_USD: f64 = 10_000.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Pools picked by each heuristic, in selection order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSelections {
    pub top_by_base_with_token_in: Vec<PoolSummary>,
    pub top_by_base_with_token_out: Vec<PoolSummary>,
    pub top_by_direct_swap_pool: Vec<PoolSummary>,
    pub top_by_eth_quote_token_pool: Vec<PoolSummary>,
    pub top_by_tvl: Vec<PoolSummary>,
    pub top_by_tvl_using_token_in: Vec<PoolSummary>,
    pub top_by_tvl_using_token_out: Vec<PoolSummary>,
    pub top_by_tvl_using_token_in_second_hops: Vec<PoolSummary>,
    pub top_by_tvl_using_token_out_second_hops: Vec<PoolSummary>,
}

impl CandidateSelections {
    /// Named buckets, in selection order
    pub fn buckets(&self) -> [(&'static str, &[PoolSummary]); 9] {
        [
            ("top_by_base_with_token_in", &self.top_by_base_with_token_in),
            ("top_by_base_with_token_out", &self.top_by_base_with_token_out),
            ("top_by_direct_swap_pool", &self.top_by_direct_swap_pool),
            ("top_by_eth_quote_token_pool", &self.top_by_eth_quote_token_pool),
            ("top_by_tvl", &self.top_by_tvl),
            ("top_by_tvl_using_token_in", &self.top_by_tvl_using_token_in),
            ("top_by_tvl_using_token_out", &self.top_by_tvl_using_token_out),
            (
                "top_by_tvl_using_token_in_second_hops",
                &self.top_by_tvl_using_token_in_second_hops,
            ),
            (
                "top_by_tvl_using_token_out_second_hops",
                &self.top_by_tvl_using_token_out_second_hops,
            ),
        ]
    }

    /// Union of all buckets, first occurrence of each id wins
    pub fn unique_pools(&self) -> Vec<PoolSummary> {
        let mut seen = HashSet::new();
        self.buckets()
            .iter()
            .flat_map(|(_, pools)| pools.iter())
            .filter(|p| seen.insert(p.id.clone()))
            .cloned()
            .collect()
    }
}

/// Curated pools with their on-chain state
#[derive(Clone)]
pub struct CandidatePools {
    pub accessor: Arc<dyn PoolAccessor>,
    pub selections: CandidateSelections,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Run every selection heuristic over an unblocked pool universe
pub fn select_candidate_pools(
    pools: &[PoolSummary],
    token_in: &Token,
    token_out: &Token,
    trade_type: TradeType,
    chain: ChainId,
    config: &PoolSelectionConfig,
) -> CandidateSelections {
    let mut sorted = pools.to_vec();
    sorted.sort_by(|a, b| b.tvl_usd.total_cmp(&a.tvl_usd));

    let token_in = &token_in.address;
    let out_symbol = token_out.symbol.as_str();
    let token_out = &token_out.address;
    let mut selected: HashSet<Address> = HashSet::new();

    // ------- Step 1: base token pairs -------
    let bases = constants::base_tokens(chain);
    let top_by_base_with_token_in = top_by_base(&sorted, &bases, token_in, config);
    let top_by_base_with_token_out = top_by_base(&sorted, &bases, token_out, config);
    if config.top_n_with_base_token_in_set {
        mark(&mut selected, &top_by_base_with_token_in);
        mark(&mut selected, &top_by_base_with_token_out);
    }

    // ------- Step 2: direct pools -------
    let mut top_by_direct_swap_pool =
        take_unselected(&sorted, &selected, config.top_n_direct_swaps, |p| {
            p.connects(token_in, token_out)
        });
    if top_by_direct_swap_pool.is_empty() && config.top_n_direct_swaps > 0 {
        top_by_direct_swap_pool = optimistic_direct_pools(token_in, token_out);
    }
    mark(&mut selected, &top_by_direct_swap_pool);

    // ------- Step 3: wrapped native pool for the quote token -------
    // Lets the gas model price gas in the quote token.
    let top_by_eth_quote_token_pool = match constants::wrapped_native(chain) {
        Some(native) if !constants::is_native_symbol(chain, out_symbol) => {
            let quote_side = match trade_type {
                TradeType::ExactInput => token_out,
                TradeType::ExactOutput => token_in,
            };
            sorted
                .iter()
                .filter(|p| p.connects(&native.address, quote_side))
                .take(1)
                .cloned()
                .collect()
        }
        _ => Vec::new(),
    };
    mark(&mut selected, &top_by_eth_quote_token_pool);

    // ------- Step 4: deepest pools overall -------
    let top_by_tvl = take_unselected(&sorted, &selected, config.top_n, |_| true);
    mark(&mut selected, &top_by_tvl);

    // ------- Step 5: deepest pools touching either side -------
    let top_by_tvl_using_token_in =
        take_unselected(&sorted, &selected, config.top_n_token_in_out, |p| {
            p.involves(token_in)
        });
    mark(&mut selected, &top_by_tvl_using_token_in);

    let top_by_tvl_using_token_out =
        take_unselected(&sorted, &selected, config.top_n_token_in_out, |p| {
            p.involves(token_out)
        });
    mark(&mut selected, &top_by_tvl_using_token_out);

    // ------- Step 6: second hops -------
    let top_by_tvl_using_token_in_second_hops = second_hops(
        &sorted,
        &selected,
        &top_by_tvl_using_token_in,
        token_in,
        config.top_n_second_hop,
    );
    mark(&mut selected, &top_by_tvl_using_token_in_second_hops);

    let top_by_tvl_using_token_out_second_hops = second_hops(
        &sorted,
        &selected,
        &top_by_tvl_using_token_out,
        token_out,
        config.top_n_second_hop,
    );

    CandidateSelections {
        top_by_base_with_token_in,
        top_by_base_with_token_out,
        top_by_direct_swap_pool,
        top_by_eth_quote_token_pool,
        top_by_tvl,
        top_by_tvl_using_token_in,
        top_by_tvl_using_token_out,
        top_by_tvl_using_token_in_second_hops,
        top_by_tvl_using_token_out_second_hops,
    }
}

fn mark(selected: &mut HashSet<Address>, pools: &[PoolSummary]) {
    selected.extend(pools.iter().map(|p| p.id.clone()));
}

fn sort_by_tvl(pools: &mut [PoolSummary]) {
    pools.sort_by(|a, b| b.tvl_usd.total_cmp(&a.tvl_usd));
}

/// First `n` pools of the TVL-sorted universe matching `pred` and not yet selected
fn take_unselected(
    sorted: &[PoolSummary],
    selected: &HashSet<Address>,
    n: usize,
    pred: impl Fn(&PoolSummary) -> bool,
) -> Vec<PoolSummary> {
    sorted
        .iter()
        .filter(|p| !selected.contains(&p.id) && pred(p))
        .take(n)
        .cloned()
        .collect()
}

fn top_by_base(
    sorted: &[PoolSummary],
    bases: &[Token],
    token: &Address,
    config: &PoolSelectionConfig,
) -> Vec<PoolSummary> {
    let mut merged: Vec<PoolSummary> = bases
        .iter()
        .flat_map(|base| {
            sorted
                .iter()
                .filter(|p| p.connects(&base.address, token))
                .take(config.top_n_with_each_base_token)
                .cloned()
                .collect::<Vec<_>>()
        })
        .collect();
    sort_by_tvl(&mut merged);
    merged.truncate(config.top_n_with_base_token);
    merged
}

fn second_hops(
    sorted: &[PoolSummary],
    selected: &HashSet<Address>,
    first_hops: &[PoolSummary],
    token: &Address,
    n: usize,
) -> Vec<PoolSummary> {
    let mut seen = HashSet::new();
    let mut hops: Vec<PoolSummary> = first_hops
        .iter()
        .filter_map(|p| p.other(token))
        .flat_map(|hop| take_unselected(sorted, selected, n, |p| p.involves(hop)))
        .filter(|p| seen.insert(p.id.clone()))
        .collect();
    sort_by_tvl(&mut hops);
    hops.truncate(n);
    hops
}

/// One summary per fee tier at the canonical address. Those with no deployed
/// pool are dropped when pool state is fetched.
fn optimistic_direct_pools(token_in: &Address, token_out: &Address) -> Vec<PoolSummary> {
    let (token0, token1) = if token_in <= token_out {
        (token_in, token_out)
    } else {
        (token_out, token_in)
    };
    FeeAmount::ALL
        .iter()
        .map(|fee| PoolSummary {
            id: canonical_pool_address(token0, token1, *fee),
            token0: token0.clone(),
            token1: token1.clone(),
            fee_tier: fee.fee_tier(),
            tvl_usd: OPTIMISTIC_POOL_TVL_USD,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Provider orchestration
// ---------------------------------------------------------------------------

/// Fetch, filter, select and materialize candidate pools
pub async fn get_candidate_pools(
    token_in: &Token,
    token_out: &Token,
    trade_type: TradeType,
    config: &RoutingConfig,
    providers: &RouterProviders,
) -> Result<CandidatePools, ProviderError> {
    let block = config.block_number;
    let universe = providers.pool_universe.get_pools(block).await?;
    let universe_size = universe.len();

    let pools = match &providers.blocklist {
        Some(blocklist) => filter_blocked(universe, blocklist.as_ref()).await?,
        None => universe,
    };

    let selections = select_candidate_pools(
        &pools,
        token_in,
        token_out,
        trade_type,
        token_in.chain_id,
        &config.pool_selection,
    );
    for (name, bucket) in selections.buckets() {
        tracing::debug!(bucket = name, pools = bucket.len(), "Candidate bucket");
    }

    let unique = selections.unique_pools();
    tracing::info!(
        "Selected {} candidate pools from {} ({} after blocklist) for {} -> {}",
        unique.len(),
        universe_size,
        pools.len(),
        token_in,
        token_out
    );

    let mut addresses: Vec<Address> = unique
        .iter()
        .flat_map(|p| [p.token0.clone(), p.token1.clone()])
        .collect();
    addresses.sort();
    addresses.dedup();
    let tokens = providers.token_resolver.resolve(&addresses, block).await?;

    let mut pairs = Vec::with_capacity(unique.len());
    for pool in &unique {
        let (Some(token0), Some(token1)) = (tokens.get(&pool.token0), tokens.get(&pool.token1))
        else {
            tracing::warn!(
                "Dropping pool {}: could not resolve tokens {} / {}",
                pool.id,
                pool.token0,
                pool.token1
            );
            continue;
        };
        let Some(fee) = FeeAmount::from_fee_tier(pool.fee_tier) else {
            tracing::info!(
                "Dropping pool {}: unsupported fee tier {}",
                pool.id,
                pool.fee_tier
            );
            continue;
        };
        pairs.push((token0.clone(), token1.clone(), fee));
    }

    let accessor = providers.pool_state.get_pools(&pairs, block).await?;
    tracing::debug!(
        "Materialized {} of {} candidate pairs",
        accessor.all_pools().len(),
        pairs.len()
    );

    Ok(CandidatePools {
        accessor,
        selections,
    })
}

async fn filter_blocked(
    pools: Vec<PoolSummary>,
    blocklist: &dyn TokenBlocklist,
) -> Result<Vec<PoolSummary>, ProviderError> {
    let mut tokens: Vec<Address> = pools
        .iter()
        .flat_map(|p| [p.token0.clone(), p.token1.clone()])
        .collect();
    tokens.sort();
    tokens.dedup();

    let flags = try_join_all(tokens.iter().map(|t| blocklist.is_blocked(t))).await?;
    let blocked: HashSet<Address> = tokens
        .into_iter()
        .zip(flags)
        .filter_map(|(token, is_blocked)| is_blocked.then_some(token))
        .collect();

    if blocked.is_empty() {
        return Ok(pools);
    }
    tracing::info!("Excluding pools touching {} blocked tokens", blocked.len());
    Ok(pools
        .into_iter()
        .filter(|p| !blocked.contains(&p.token0) && !blocked.contains(&p.token1))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{
        FixedGasPrice, HopGasModelFactory, LocalQuoter, MemoryPoolUniverse, SimulatedPoolState,
        StaticBlocklist, StaticTokenList,
    };
    use crate::state::{q96, TradablePool};
    use num_bigint::BigUint;

    fn make_token(n: u8, symbol: &str) -> Token {
        let addr = format!("0x{:02x}{}", n, "0".repeat(38));
        Token::new(ChainId::Mainnet, Address::parse(&addr).unwrap(), symbol, 18)
    }

    fn weth() -> Token {
        Token::new(
            ChainId::Mainnet,
            Address::parse(constants::mainnet::WETH.0).unwrap(),
            "WETH",
            18,
        )
    }

    fn usdc() -> Token {
        Token::new(
            ChainId::Mainnet,
            Address::parse(constants::mainnet::USDC.0).unwrap(),
            "USDC",
            6,
        )
    }

    fn make_summary(a: &Token, b: &Token, fee: FeeAmount, tvl_usd: f64) -> PoolSummary {
        let (t0, t1) = if a.sorts_before(b) { (a, b) } else { (b, a) };
        PoolSummary {
            id: canonical_pool_address(&t0.address, &t1.address, fee),
            token0: t0.address.clone(),
            token1: t1.address.clone(),
            fee_tier: fee.fee_tier(),
            tvl_usd,
        }
    }

    fn ids(pools: &[PoolSummary]) -> Vec<Address> {
        pools.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_direct_pools_then_tvl_excludes_selected() {
        let a = make_token(1, "AAA");
        let b = make_token(2, "BBB");
        let c = make_token(3, "CCC");
        let d = make_token(4, "DDD");

        let direct_low = make_summary(&a, &b, FeeAmount::Low, 900.0);
        let direct_med = make_summary(&a, &b, FeeAmount::Medium, 800.0);
        let direct_high = make_summary(&a, &b, FeeAmount::High, 100.0);
        let cd = make_summary(&c, &d, FeeAmount::Low, 5000.0);
        let ac = make_summary(&a, &c, FeeAmount::Low, 300.0);
        let universe = vec![
            direct_high.clone(),
            ac.clone(),
            direct_med.clone(),
            cd.clone(),
            direct_low.clone(),
        ];

        let sel = select_candidate_pools(
            &universe,
            &a,
            &b,
            TradeType::ExactInput,
            ChainId::Mainnet,
            &PoolSelectionConfig::default(),
        );

        assert_eq!(
            ids(&sel.top_by_direct_swap_pool),
            ids(&[direct_low.clone(), direct_med.clone()])
        );
        // Deepest two not already taken as direct pools
        assert_eq!(ids(&sel.top_by_tvl), ids(&[cd, ac.clone()]));
        // Token in pools left over after direct and tvl buckets
        assert_eq!(ids(&sel.top_by_tvl_using_token_in), ids(&[direct_high]));
        assert!(sel.top_by_tvl_using_token_out.is_empty());
        assert!(sel.top_by_eth_quote_token_pool.is_empty());

        let unique = sel.unique_pools();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_optimistic_direct_pools_when_none_indexed() {
        let a = make_token(1, "AAA");
        let b = make_token(2, "BBB");
        let c = make_token(3, "CCC");
        let universe = vec![make_summary(&a, &c, FeeAmount::Low, 1000.0)];

        let sel = select_candidate_pools(
            &universe,
            &b,
            &a,
            TradeType::ExactInput,
            ChainId::Mainnet,
            &PoolSelectionConfig::default(),
        );

        assert_eq!(sel.top_by_direct_swap_pool.len(), 4);
        for (pool, fee) in sel.top_by_direct_swap_pool.iter().zip(FeeAmount::ALL) {
            assert_eq!(pool.fee_tier, fee.fee_tier());
            assert_eq!(pool.tvl_usd, OPTIMISTIC_POOL_TVL_USD);
            assert_eq!(pool.token0, a.address);
            assert_eq!(pool.id, canonical_pool_address(&a.address, &b.address, fee));
        }

        let disabled = PoolSelectionConfig {
            top_n_direct_swaps: 0,
            ..PoolSelectionConfig::default()
        };
        let sel = select_candidate_pools(
            &universe,
            &b,
            &a,
            TradeType::ExactInput,
            ChainId::Mainnet,
            &disabled,
        );
        assert!(sel.top_by_direct_swap_pool.is_empty());
    }

    #[test]
    fn test_eth_quote_token_pool() {
        let a = make_token(1, "AAA");
        let b = make_token(2, "BBB");
        let weth_b = make_summary(&weth(), &b, FeeAmount::Medium, 50.0);
        let weth_a = make_summary(&weth(), &a, FeeAmount::Medium, 40.0);
        let universe = vec![weth_b.clone(), weth_a.clone()];
        let config = PoolSelectionConfig::default();

        let sel = select_candidate_pools(
            &universe,
            &a,
            &b,
            TradeType::ExactInput,
            ChainId::Mainnet,
            &config,
        );
        assert_eq!(ids(&sel.top_by_eth_quote_token_pool), ids(&[weth_b]));

        let sel = select_candidate_pools(
            &universe,
            &a,
            &b,
            TradeType::ExactOutput,
            ChainId::Mainnet,
            &config,
        );
        assert_eq!(ids(&sel.top_by_eth_quote_token_pool), ids(&[weth_a]));

        // Buying the native token itself needs no conversion pool
        let sel = select_candidate_pools(
            &universe,
            &a,
            &weth(),
            TradeType::ExactInput,
            ChainId::Mainnet,
            &config,
        );
        assert!(sel.top_by_eth_quote_token_pool.is_empty());
    }

    #[test]
    fn test_base_token_buckets() {
        let a = make_token(1, "AAA");
        let b = make_token(2, "BBB");
        let usdc_a_low = make_summary(&usdc(), &a, FeeAmount::Low, 700.0);
        let usdc_a_med = make_summary(&usdc(), &a, FeeAmount::Medium, 600.0);
        let weth_a = make_summary(&weth(), &a, FeeAmount::Medium, 650.0);
        let universe = vec![usdc_a_med.clone(), weth_a.clone(), usdc_a_low.clone()];

        let config = PoolSelectionConfig {
            top_n_with_each_base_token: 1,
            top_n_with_base_token: 5,
            ..PoolSelectionConfig::default()
        };
        let sel = select_candidate_pools(
            &universe,
            &a,
            &b,
            TradeType::ExactInput,
            ChainId::Mainnet,
            &config,
        );
        // One per base, merged by tvl
        assert_eq!(
            ids(&sel.top_by_base_with_token_in),
            ids(&[usdc_a_low.clone(), weth_a.clone()])
        );
        assert!(sel.top_by_base_with_token_out.is_empty());
        // Not in the dedup set, so top_by_tvl can take them again
        assert_eq!(ids(&sel.top_by_tvl), ids(&[usdc_a_low.clone(), weth_a]));

        let in_set = PoolSelectionConfig {
            top_n_with_base_token_in_set: true,
            ..config
        };
        let sel = select_candidate_pools(
            &universe,
            &a,
            &b,
            TradeType::ExactInput,
            ChainId::Mainnet,
            &in_set,
        );
        assert_eq!(ids(&sel.top_by_tvl), ids(&[usdc_a_med]));
    }

    #[test]
    fn test_second_hops() {
        let a = make_token(1, "AAA");
        let b = make_token(2, "BBB");
        let c = make_token(3, "CCC");
        let d = make_token(4, "DDD");
        let ab = make_summary(&a, &b, FeeAmount::Low, 10.0);
        let ac = make_summary(&a, &c, FeeAmount::Low, 500.0);
        let cd_deep = make_summary(&c, &d, FeeAmount::Low, 400.0);
        let cd_shallow = make_summary(&c, &d, FeeAmount::Medium, 30.0);

        let config = PoolSelectionConfig {
            top_n: 0,
            top_n_token_in_out: 1,
            top_n_second_hop: 1,
            ..PoolSelectionConfig::default()
        };
        let sel = select_candidate_pools(
            &[ab, ac.clone(), cd_deep.clone(), cd_shallow],
            &a,
            &b,
            TradeType::ExactInput,
            ChainId::Mainnet,
            &config,
        );
        assert_eq!(ids(&sel.top_by_tvl_using_token_in), ids(&[ac]));
        assert_eq!(ids(&sel.top_by_tvl_using_token_in_second_hops), ids(&[cd_deep]));
    }

    fn providers(
        universe: Vec<PoolSummary>,
        tokens: Vec<Token>,
        pools: Vec<TradablePool>,
        blocked: Vec<Address>,
    ) -> RouterProviders {
        RouterProviders {
            pool_universe: Arc::new(MemoryPoolUniverse::new(universe)),
            blocklist: Some(Arc::new(StaticBlocklist::new(blocked))),
            token_resolver: Arc::new(StaticTokenList::new(tokens)),
            pool_state: Arc::new(SimulatedPoolState::new(pools)),
            quoter: Arc::new(LocalQuoter::new(1)),
            gas_price: Arc::new(FixedGasPrice::new(BigUint::from(1u8))),
            gas_model_factory: Arc::new(HopGasModelFactory::default()),
        }
    }

    fn make_pool(a: &Token, b: &Token, fee: FeeAmount) -> TradablePool {
        TradablePool::new(a.clone(), b.clone(), fee, q96(), BigUint::from(10u64.pow(12)))
    }

    #[tokio::test]
    async fn test_unresolved_token_pool_is_dropped() {
        let a = make_token(1, "AAA");
        let b = make_token(2, "BBB");
        let x = make_token(9, "XXX");
        let universe = vec![
            make_summary(&a, &b, FeeAmount::Low, 100.0),
            make_summary(&a, &x, FeeAmount::Low, 90.0),
        ];
        // x has on-chain state but no metadata
        let providers = providers(
            universe,
            vec![a.clone(), b.clone()],
            vec![make_pool(&a, &b, FeeAmount::Low), make_pool(&a, &x, FeeAmount::Low)],
            vec![],
        );

        let candidates =
            get_candidate_pools(&a, &b, TradeType::ExactInput, &RoutingConfig::default(), &providers)
                .await
                .unwrap();

        assert!(candidates
            .selections
            .unique_pools()
            .iter()
            .any(|p| p.token1 == x.address || p.token0 == x.address));
        let pools = candidates.accessor.all_pools();
        assert_eq!(pools.len(), 1);
        assert!(pools[0].involves_token(&a) && pools[0].involves_token(&b));
    }

    #[tokio::test]
    async fn test_unsupported_fee_and_blocked_tokens_are_dropped() {
        let a = make_token(1, "AAA");
        let b = make_token(2, "BBB");
        let c = make_token(3, "CCC");
        let mut odd_fee = make_summary(&a, &b, FeeAmount::Medium, 200.0);
        odd_fee.fee_tier = 2500;
        let universe = vec![
            odd_fee,
            make_summary(&a, &b, FeeAmount::Low, 100.0),
            make_summary(&a, &c, FeeAmount::Low, 90.0),
        ];
        let providers = providers(
            universe,
            vec![a.clone(), b.clone(), c.clone()],
            vec![make_pool(&a, &b, FeeAmount::Low), make_pool(&a, &c, FeeAmount::Low)],
            vec![c.address.clone()],
        );

        let candidates =
            get_candidate_pools(&a, &b, TradeType::ExactInput, &RoutingConfig::default(), &providers)
                .await
                .unwrap();

        assert!(candidates
            .selections
            .unique_pools()
            .iter()
            .all(|p| !p.involves(&c.address)));
        let pools = candidates.accessor.all_pools();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].fee, FeeAmount::Low);
    }
}
