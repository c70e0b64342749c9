//! In-memory providers
//!
//! Snapshot-backed implementations of every collaborator in
//! [`crate::providers`]. Pools are simulated as a single liquidity range, so
//! a swap is constant-product math on the range's virtual reserves.

use async_trait::async_trait;
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use waypoint_core::{
    Address, BlockNumber, ChainId, FeeAmount, ProviderError, Token, TradeType,
};

use crate::constants;
use crate::providers::{
    GasModel, GasModelFactory, GasPriceProvider, PoolAccessor, PoolStateProvider, PoolUniverseSource,
    QuoteBatch, QuoteProvider, TokenBlocklist, TokenResolver,
};
use crate::state::{
    canonical_pool_address, GasCost, PoolSummary, RawQuote, Route, RouteQuote, TradablePool,
};

/// Fee denominator: tiers are hundredths of a bip
const FEE_DENOM: u32 = 1_000_000;

/// Quoter's own gas accounting
const QUOTER_BASE_GAS: u64 = 21_000;
const QUOTER_HOP_GAS: u64 = 60_000;

// ---------------------------------------------------------------------------
// Universe, blocklist and tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryPoolUniverse {
    pools: Vec<PoolSummary>,
}

impl MemoryPoolUniverse {
    pub fn new(pools: Vec<PoolSummary>) -> Self {
        Self { pools }
    }
}

#[async_trait]
impl PoolUniverseSource for MemoryPoolUniverse {
    async fn get_pools(&self, _block: Option<BlockNumber>) -> Result<Vec<PoolSummary>, ProviderError> {
        Ok(self.pools.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticBlocklist {
    blocked: HashSet<Address>,
}

impl StaticBlocklist {
    pub fn new(blocked: impl IntoIterator<Item = Address>) -> Self {
        Self {
            blocked: blocked.into_iter().collect(),
        }
    }
}

#[async_trait]
impl TokenBlocklist for StaticBlocklist {
    async fn is_blocked(&self, address: &Address) -> Result<bool, ProviderError> {
        Ok(self.blocked.contains(address))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticTokenList {
    tokens: HashMap<Address, Token>,
}

impl StaticTokenList {
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| (t.address.clone(), t))
                .collect(),
        }
    }

    pub fn get(&self, address: &Address) -> Option<&Token> {
        self.tokens.get(address)
    }
}

#[async_trait]
impl TokenResolver for StaticTokenList {
    async fn resolve(
        &self,
        addresses: &[Address],
        _block: Option<BlockNumber>,
    ) -> Result<HashMap<Address, Token>, ProviderError> {
        Ok(addresses
            .iter()
            .filter_map(|a| self.tokens.get(a).map(|t| (a.clone(), t.clone())))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Pool state
// ---------------------------------------------------------------------------

/// Snapshot of pool state keyed by canonical pool address
#[derive(Debug, Clone, Default)]
pub struct SimulatedPoolState {
    pools: BTreeMap<Address, TradablePool>,
}

impl SimulatedPoolState {
    pub fn new(pools: impl IntoIterator<Item = TradablePool>) -> Self {
        Self {
            pools: pools.into_iter().map(|p| (p.address(), p)).collect(),
        }
    }
}

#[async_trait]
impl PoolStateProvider for SimulatedPoolState {
    async fn get_pools(
        &self,
        pairs: &[(Token, Token, FeeAmount)],
        _block: Option<BlockNumber>,
    ) -> Result<Arc<dyn PoolAccessor>, ProviderError> {
        let pools = pairs
            .iter()
            .filter_map(|(a, b, fee)| {
                let address = canonical_pool_address(&a.address, &b.address, *fee);
                self.pools.get(&address).map(|p| (address, p.clone()))
            })
            .collect();
        Ok(Arc::new(SimulatedPoolAccessor { pools }))
    }
}

/// Pools materialized for one call, iterated in address order
#[derive(Debug, Clone, Default)]
pub struct SimulatedPoolAccessor {
    pools: BTreeMap<Address, TradablePool>,
}

impl PoolAccessor for SimulatedPoolAccessor {
    fn all_pools(&self) -> Vec<TradablePool> {
        self.pools.values().cloned().collect()
    }

    fn pool_address(&self, token_a: &Token, token_b: &Token, fee: FeeAmount) -> Address {
        canonical_pool_address(&token_a.address, &token_b.address, fee)
    }

    fn pool(&self, token_a: &Token, token_b: &Token, fee: FeeAmount) -> Option<TradablePool> {
        self.pools
            .get(&self.pool_address(token_a, token_b, fee))
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Swap math
// ---------------------------------------------------------------------------

fn fee_num(fee: FeeAmount) -> BigUint {
    BigUint::from(FEE_DENOM - fee.fee_tier())
}

/// Output for `amount_in`: `out = r_out * in * f / (r_in * D + in * f)`
pub fn calculate_output(
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    amount_in: &BigUint,
    fee: FeeAmount,
) -> BigUint {
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_in.is_zero() {
        return BigUint::zero();
    }
    let f = fee_num(fee);
    let numerator = reserve_out * amount_in * &f;
    let denominator = reserve_in * BigUint::from(FEE_DENOM) + amount_in * &f;
    numerator / denominator
}

/// Input needed for `amount_out`, rounded up. `None` if the pool cannot
/// supply that much.
pub fn calculate_input(
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    amount_out: &BigUint,
    fee: FeeAmount,
) -> Option<BigUint> {
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_out.is_zero() {
        return None;
    }
    if amount_out >= reserve_out {
        return None;
    }
    let numerator = reserve_in * amount_out * BigUint::from(FEE_DENOM);
    let denominator = (reserve_out - amount_out) * fee_num(fee);
    Some(numerator / denominator + 1u8)
}

/// One simulated hop
struct HopResult {
    amount_in: BigUint,
    amount_out: BigUint,
    sqrt_price_x96_after: BigUint,
}

/// Settle a hop on the pool's virtual reserves. Only the fee-adjusted input
/// moves the price.
fn settle_hop(
    pool: &TradablePool,
    token_in: &Token,
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    amount_in: BigUint,
    amount_out: BigUint,
) -> Option<HopResult> {
    let effective_in = &amount_in * fee_num(pool.fee) / BigUint::from(FEE_DENOM);
    let new_in = reserve_in + effective_in;
    let new_out = reserve_out - &amount_out;
    let (x, y) = if &pool.token0 == token_in {
        (new_in, new_out)
    } else {
        (new_out, new_in)
    };
    if x.is_zero() {
        return None;
    }
    // sqrt(y / x) * 2^96
    let sqrt_price_x96_after = ((y << 192u32) / x).sqrt();
    Some(HopResult {
        amount_in,
        amount_out,
        sqrt_price_x96_after,
    })
}

fn swap_exact_in(pool: &TradablePool, token_in: &Token, amount_in: BigUint) -> Option<HopResult> {
    let (reserve_in, reserve_out) = pool.reserves_for(token_in)?;
    let amount_out = calculate_output(&reserve_in, &reserve_out, &amount_in, pool.fee);
    if amount_out.is_zero() {
        return None;
    }
    settle_hop(pool, token_in, &reserve_in, &reserve_out, amount_in, amount_out)
}

fn swap_exact_out(pool: &TradablePool, token_in: &Token, amount_out: BigUint) -> Option<HopResult> {
    let (reserve_in, reserve_out) = pool.reserves_for(token_in)?;
    let amount_in = calculate_input(&reserve_in, &reserve_out, &amount_out, pool.fee)?;
    settle_hop(pool, token_in, &reserve_in, &reserve_out, amount_in, amount_out)
}

/// Price `route` at `amount`, chaining hops forward (exact input) or
/// backward (exact output)
pub fn simulate_route(route: &Route, amount: &BigUint, trade_type: TradeType) -> RawQuote {
    let tokens = route.token_path();
    if tokens.len() != route.pools.len() + 1 {
        return RawQuote::failed(amount.clone());
    }

    let hops = route.pools.len();
    let mut sqrt_prices = Vec::with_capacity(hops);
    let quote = match trade_type {
        TradeType::ExactInput => {
            let mut current = amount.clone();
            for (pool, token_in) in route.pools.iter().zip(&tokens) {
                let Some(hop) = swap_exact_in(pool, token_in, current) else {
                    return RawQuote::failed(amount.clone());
                };
                sqrt_prices.push(hop.sqrt_price_x96_after);
                current = hop.amount_out;
            }
            current
        }
        TradeType::ExactOutput => {
            let mut current = amount.clone();
            for (pool, token_in) in route.pools.iter().zip(&tokens[..hops]).rev() {
                let Some(hop) = swap_exact_out(pool, token_in, current) else {
                    return RawQuote::failed(amount.clone());
                };
                sqrt_prices.push(hop.sqrt_price_x96_after);
                current = hop.amount_in;
            }
            sqrt_prices.reverse();
            current
        }
    };

    RawQuote {
        amount: amount.clone(),
        quote: Some(quote),
        sqrt_price_x96_after_list: Some(sqrt_prices),
        // A single range has no initialized ticks inside it
        initialized_ticks_crossed_list: Some(vec![0; hops]),
        gas_estimate: Some(QUOTER_BASE_GAS + QUOTER_HOP_GAS * hops as u64),
    }
}

/// Quotes routes against the pools embedded in each route
#[derive(Debug, Clone)]
pub struct LocalQuoter {
    block_number: BlockNumber,
}

impl LocalQuoter {
    /// `block_number` is reported for calls that do not pin a block
    pub fn new(block_number: BlockNumber) -> Self {
        Self { block_number }
    }
}

#[async_trait]
impl QuoteProvider for LocalQuoter {
    async fn get_quotes(
        &self,
        amounts: &[BigUint],
        routes: &[Route],
        trade_type: TradeType,
        block: Option<BlockNumber>,
    ) -> Result<QuoteBatch, ProviderError> {
        let routes_with_quotes = routes
            .iter()
            .map(|route| {
                let quotes = amounts
                    .iter()
                    .map(|amount| simulate_route(route, amount, trade_type))
                    .collect();
                (route.clone(), quotes)
            })
            .collect();

        Ok(QuoteBatch {
            routes_with_quotes,
            block_number: block.unwrap_or(self.block_number),
        })
    }
}

// ---------------------------------------------------------------------------
// Gas
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FixedGasPrice {
    wei: BigUint,
}

impl FixedGasPrice {
    pub fn new(wei: BigUint) -> Self {
        Self { wei }
    }
}

#[async_trait]
impl GasPriceProvider for FixedGasPrice {
    async fn gas_price_wei(&self) -> Result<BigUint, ProviderError> {
        Ok(self.wei.clone())
    }
}

/// Gas units charged per route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopGasCosts {
    pub base: u64,
    pub per_hop: u64,
    pub per_initialized_tick: u64,
}

impl Default for HopGasCosts {
    fn default() -> Self {
        Self {
            base: 2_000,
            per_hop: 80_000,
            per_initialized_tick: 31_000,
        }
    }
}

/// Builds [`HopGasModel`]s priced off the call's candidate pools
#[derive(Debug, Clone, Default)]
pub struct HopGasModelFactory {
    pub costs: HopGasCosts,
}

#[async_trait]
impl GasModelFactory for HopGasModelFactory {
    async fn build(
        &self,
        chain: ChainId,
        gas_price_wei: &BigUint,
        accessor: Arc<dyn PoolAccessor>,
        quote_token: &Token,
    ) -> Result<Arc<dyn GasModel>, ProviderError> {
        let native = constants::wrapped_native(chain).ok_or_else(|| ProviderError::GasModel {
            message: format!("no wrapped native token on {}", chain),
        })?;

        let native_quote_pool = if quote_token == &native {
            None
        } else {
            deepest_pool(accessor.as_ref(), &native, std::slice::from_ref(quote_token))
        };
        let native_usd_pool =
            deepest_pool(accessor.as_ref(), &native, &constants::usd_tokens(chain));

        if quote_token != &native && native_quote_pool.is_none() {
            tracing::warn!(
                "No {}/{} pool among candidates; gas cost in {} will be zero",
                native,
                quote_token,
                quote_token
            );
        }

        Ok(Arc::new(HopGasModel {
            costs: self.costs,
            gas_price_wei: gas_price_wei.clone(),
            native,
            quote_token: quote_token.clone(),
            native_quote_pool,
            native_usd_pool,
        }))
    }
}

/// Most liquid materialized pool pairing `native` with any of `others`, over
/// every fee tier
fn deepest_pool(
    accessor: &dyn PoolAccessor,
    native: &Token,
    others: &[Token],
) -> Option<TradablePool> {
    others
        .iter()
        .flat_map(|other| FeeAmount::ALL.iter().map(move |fee| (other, *fee)))
        .filter_map(|(other, fee)| accessor.pool(native, other, fee))
        .max_by(|a, b| a.liquidity.cmp(&b.liquidity))
}

/// `base + per_hop * hops + per_initialized_tick * ticks` gas units
#[derive(Debug, Clone)]
pub struct HopGasModel {
    costs: HopGasCosts,
    gas_price_wei: BigUint,
    native: Token,
    quote_token: Token,
    native_quote_pool: Option<TradablePool>,
    native_usd_pool: Option<TradablePool>,
}

impl HopGasModel {
    pub fn gas_units(&self, quote: &RouteQuote) -> u64 {
        let ticks: u64 = quote
            .initialized_ticks_crossed_list
            .iter()
            .map(|t| u64::from(*t))
            .sum();
        self.costs.base
            + self.costs.per_hop * quote.route.hops() as u64
            + self.costs.per_initialized_tick * ticks
    }
}

impl GasModel for HopGasModel {
    fn estimate_gas_cost(&self, quote: &RouteQuote) -> GasCost {
        let gas_estimate = self.gas_units(quote);
        let cost_wei = BigUint::from(gas_estimate) * &self.gas_price_wei;

        let gas_cost_in_token = if self.quote_token == self.native {
            cost_wei.clone()
        } else {
            self.native_quote_pool
                .as_ref()
                .and_then(|p| p.spot_value(&self.native, &cost_wei))
                .unwrap_or_default()
        };
        let gas_cost_in_usd = self
            .native_usd_pool
            .as_ref()
            .and_then(|p| p.spot_value(&self.native, &cost_wei))
            .unwrap_or_default();

        GasCost {
            gas_estimate,
            gas_cost_in_token,
            gas_cost_in_usd,
        }
    }
}
