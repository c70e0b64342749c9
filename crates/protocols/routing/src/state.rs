//! Routing State Types
//!
//! Pools, routes, quotes and the final split plan.

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::HashSet;
use std::fmt;
use waypoint_core::{Address, BlockNumber, FeeAmount, InvalidQuote, Token, TradeType};

use crate::constants::deployment;
use crate::providers::{GasModel, PoolAccessor};

/// 2^96, the fixed-point scale of `sqrt_price_x96`
pub fn q96() -> BigUint {
    BigUint::from(1u8) << 96
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

/// Indexer row for one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSummary {
    /// Pool address
    pub id: Address,
    pub token0: Address,
    pub token1: Address,
    /// Raw fee tier; may be a tier the router does not support
    pub fee_tier: u32,
    /// Liquidity in USD. Ranking only.
    pub tvl_usd: f64,
}

impl PoolSummary {
    pub fn involves(&self, token: &Address) -> bool {
        &self.token0 == token || &self.token1 == token
    }

    pub fn connects(&self, a: &Address, b: &Address) -> bool {
        (&self.token0 == a && &self.token1 == b) || (&self.token0 == b && &self.token1 == a)
    }

    /// The token on the other side of `token`, if the pool holds it
    pub fn other(&self, token: &Address) -> Option<&Address> {
        if &self.token0 == token {
            Some(&self.token1)
        } else if &self.token1 == token {
            Some(&self.token0)
        } else {
            None
        }
    }
}

/// Canonical pool address for a (pair, fee).
///
/// `keccak256(0xff ++ factory ++ salt ++ init_code_hash)[12..]` with
/// `salt = keccak256(abi.encode(token0, token1, fee))`. Token order is
/// normalized so either argument order yields the same address.
pub fn compute_pool_address(
    factory: &Address,
    token_a: &Address,
    token_b: &Address,
    fee: FeeAmount,
) -> Address {
    let (token0, token1) = if token_a <= token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    };

    // abi.encode pads each word to 32 bytes
    let mut encoded = [0u8; 96];
    encoded[12..32].copy_from_slice(&token0.to_bytes());
    encoded[44..64].copy_from_slice(&token1.to_bytes());
    encoded[92..96].copy_from_slice(&fee.fee_tier().to_be_bytes());
    let salt = Keccak256::digest(encoded);

    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(&factory.to_bytes());
    preimage.extend_from_slice(&salt);
    preimage.extend_from_slice(&deployment::POOL_INIT_CODE_HASH);
    let hash = Keccak256::digest(&preimage);

    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address::from_bytes(out)
}

/// Address under the default factory deployment
pub fn canonical_pool_address(token_a: &Address, token_b: &Address, fee: FeeAmount) -> Address {
    compute_pool_address(
        &Address::from_bytes(deployment::POOL_FACTORY),
        token_a,
        token_b,
        fee,
    )
}

/// Pool with enough state to price a swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradablePool {
    pub token0: Token,
    pub token1: Token,
    pub fee: FeeAmount,
    /// sqrt(token1 / token0) as Q64.96
    pub sqrt_price_x96: BigUint,
    /// In-range liquidity
    pub liquidity: BigUint,
}

impl TradablePool {
    /// Build a pool, sorting the tokens into token0/token1
    pub fn new(
        token_a: Token,
        token_b: Token,
        fee: FeeAmount,
        sqrt_price_x96: BigUint,
        liquidity: BigUint,
    ) -> Self {
        let (token0, token1) = if token_a.sorts_before(&token_b) {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        Self {
            token0,
            token1,
            fee,
            sqrt_price_x96,
            liquidity,
        }
    }

    pub fn involves_token(&self, token: &Token) -> bool {
        &self.token0 == token || &self.token1 == token
    }

    pub fn other_token(&self, token: &Token) -> Option<&Token> {
        if &self.token0 == token {
            Some(&self.token1)
        } else if &self.token1 == token {
            Some(&self.token0)
        } else {
            None
        }
    }

    pub fn address(&self) -> Address {
        canonical_pool_address(&self.token0.address, &self.token1.address, self.fee)
    }

    /// Constant-product reserves equivalent to the in-range liquidity:
    /// `x = L * 2^96 / sqrtP`, `y = L * sqrtP / 2^96`.
    pub fn virtual_reserves(&self) -> (BigUint, BigUint) {
        if self.sqrt_price_x96.is_zero() {
            return (BigUint::zero(), BigUint::zero());
        }
        let q = q96();
        let x = &self.liquidity * &q / &self.sqrt_price_x96;
        let y = &self.liquidity * &self.sqrt_price_x96 / q;
        (x, y)
    }

    /// `(reserve_in, reserve_out)` when selling `token_in`
    pub fn reserves_for(&self, token_in: &Token) -> Option<(BigUint, BigUint)> {
        let (x, y) = self.virtual_reserves();
        if &self.token0 == token_in {
            Some((x, y))
        } else if &self.token1 == token_in {
            Some((y, x))
        } else {
            None
        }
    }

    /// Value `amount` of `token` in units of the other token at the spot price
    pub fn spot_value(&self, token: &Token, amount: &BigUint) -> Option<BigUint> {
        let (reserve_in, reserve_out) = self.reserves_for(token)?;
        if reserve_in.is_zero() {
            return None;
        }
        Some(amount * reserve_out / reserve_in)
    }
}

impl fmt::Display for TradablePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.token0, self.token1, self.fee)
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Ordered pools from `token_in` to `token_out`; consecutive pools share a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub pools: Vec<TradablePool>,
    pub token_in: Token,
    pub token_out: Token,
}

impl Route {
    pub fn new(pools: Vec<TradablePool>, token_in: Token, token_out: Token) -> Self {
        Self {
            pools,
            token_in,
            token_out,
        }
    }

    pub fn hops(&self) -> usize {
        self.pools.len()
    }

    /// Tokens visited in order, starting at `token_in`
    pub fn token_path(&self) -> Vec<Token> {
        let mut path = Vec::with_capacity(self.pools.len() + 1);
        let mut current = self.token_in.clone();
        path.push(current.clone());
        for pool in &self.pools {
            match pool.other_token(&current) {
                Some(next) => {
                    current = next.clone();
                    path.push(current.clone());
                }
                None => break,
            }
        }
        path
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = self.token_path();
        if let Some(first) = tokens.first() {
            write!(f, "{}", first)?;
        }
        for (pool, token) in self.pools.iter().zip(tokens.iter().skip(1)) {
            write!(f, " -- {} --> {}", pool.fee, token)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// Quoter output for one route at one amount; any field may be missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuote {
    pub amount: BigUint,
    pub quote: Option<BigUint>,
    pub sqrt_price_x96_after_list: Option<Vec<BigUint>>,
    pub initialized_ticks_crossed_list: Option<Vec<u32>>,
    pub gas_estimate: Option<u64>,
}

impl RawQuote {
    /// A quote the quoter could not produce
    pub fn failed(amount: BigUint) -> Self {
        Self {
            amount,
            quote: None,
            sqrt_price_x96_after_list: None,
            initialized_ticks_crossed_list: None,
            gas_estimate: None,
        }
    }

    /// Require every field, producing the pre-gas quote
    pub fn validate(self, route: &Route, percent: u8) -> Result<RouteQuote, InvalidQuote> {
        let quote = self.quote.ok_or(InvalidQuote::MissingAmount)?;
        let sqrt_price_x96_after_list = self
            .sqrt_price_x96_after_list
            .ok_or(InvalidQuote::MissingSqrtPrices)?;
        let initialized_ticks_crossed_list = self
            .initialized_ticks_crossed_list
            .ok_or(InvalidQuote::MissingTicksCrossed)?;
        let quoter_gas_estimate = self.gas_estimate.ok_or(InvalidQuote::MissingGasEstimate)?;

        Ok(RouteQuote {
            route: route.clone(),
            percent,
            amount: self.amount,
            quote,
            sqrt_price_x96_after_list,
            initialized_ticks_crossed_list,
            quoter_gas_estimate,
        })
    }
}

/// Complete quote for a route, before gas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuote {
    pub route: Route,
    pub percent: u8,
    pub amount: BigUint,
    pub quote: BigUint,
    pub sqrt_price_x96_after_list: Vec<BigUint>,
    pub initialized_ticks_crossed_list: Vec<u32>,
    pub quoter_gas_estimate: u64,
}

/// Gas model output for one route quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasCost {
    pub gas_estimate: u64,
    pub gas_cost_in_token: BigUint,
    pub gas_cost_in_usd: BigUint,
}

/// Route quote with gas folded in. Immutable once built.
#[derive(Debug, Clone)]
pub struct ValidatedRouteQuote {
    pub route: Route,
    pub percent: u8,
    pub amount: BigUint,
    pub quote: BigUint,
    /// Output minus gas (exact input) or input plus gas (exact output)
    pub quote_adjusted_for_gas: BigInt,
    pub gas_estimate: u64,
    pub gas_cost_in_token: BigUint,
    pub gas_cost_in_usd: BigUint,
    pub pool_addresses: Vec<Address>,
    pub sqrt_price_x96_after_list: Vec<BigUint>,
    pub initialized_ticks_crossed_list: Vec<u32>,
    pub trade_type: TradeType,
}

impl ValidatedRouteQuote {
    pub fn new(
        route_quote: RouteQuote,
        trade_type: TradeType,
        gas_model: &dyn GasModel,
        accessor: &dyn PoolAccessor,
    ) -> Self {
        let gas = gas_model.estimate_gas_cost(&route_quote);

        let quote = BigInt::from(route_quote.quote.clone());
        let gas_in_token = BigInt::from(gas.gas_cost_in_token.clone());
        let quote_adjusted_for_gas = match trade_type {
            TradeType::ExactInput => quote - gas_in_token,
            TradeType::ExactOutput => quote + gas_in_token,
        };

        let pool_addresses = route_quote
            .route
            .pools
            .iter()
            .map(|p| accessor.pool_address(&p.token0, &p.token1, p.fee))
            .collect();

        Self {
            route: route_quote.route,
            percent: route_quote.percent,
            amount: route_quote.amount,
            quote: route_quote.quote,
            quote_adjusted_for_gas,
            gas_estimate: gas.gas_estimate,
            gas_cost_in_token: gas.gas_cost_in_token,
            gas_cost_in_usd: gas.gas_cost_in_usd,
            pool_addresses,
            sqrt_price_x96_after_list: route_quote.sqrt_price_x96_after_list,
            initialized_ticks_crossed_list: route_quote.initialized_ticks_crossed_list,
            trade_type,
        }
    }

    /// Whether any of this quote's pools is in `used`
    pub fn uses_any_pool(&self, used: &HashSet<Address>) -> bool {
        self.pool_addresses.iter().any(|a| used.contains(a))
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// One leg of the final split
#[derive(Debug, Clone)]
pub struct RouteAmount {
    pub route: Route,
    pub percent: u8,
    pub amount: BigUint,
    pub quote: BigUint,
    pub quote_adjusted_for_gas: BigInt,
    pub gas_estimate: u64,
    pub gas_cost_in_token: BigUint,
    pub gas_cost_in_usd: BigUint,
    pub pool_addresses: Vec<Address>,
}

impl From<ValidatedRouteQuote> for RouteAmount {
    fn from(q: ValidatedRouteQuote) -> Self {
        Self {
            route: q.route,
            percent: q.percent,
            amount: q.amount,
            quote: q.quote,
            quote_adjusted_for_gas: q.quote_adjusted_for_gas,
            gas_estimate: q.gas_estimate,
            gas_cost_in_token: q.gas_cost_in_token,
            gas_cost_in_usd: q.gas_cost_in_usd,
            pool_addresses: q.pool_addresses,
        }
    }
}

/// Best split found for a trade
#[derive(Debug, Clone)]
pub struct SwapRoute {
    pub trade_type: TradeType,
    /// Requested amount; legs sum to exactly this
    pub amount: BigUint,
    pub quote: BigUint,
    pub quote_gas_adjusted: BigInt,
    pub estimated_gas_used: u64,
    pub estimated_gas_used_quote_token: BigUint,
    pub estimated_gas_used_usd: BigUint,
    pub gas_price_wei: BigUint,
    /// Legs by descending amount
    pub route: Vec<RouteAmount>,
    pub block_number: BlockNumber,
}

impl SwapRoute {
    pub fn pool_addresses(&self) -> impl Iterator<Item = &Address> {
        self.route.iter().flat_map(|r| r.pool_addresses.iter())
    }
}
