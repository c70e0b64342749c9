//! External collaborators of the router
//!
//! Everything the engine needs from the outside world: the pool universe,
//! token metadata, pool state, quotes and gas. Implementations must be
//! `Send + Sync` so one router can serve concurrent calls.

use async_trait::async_trait;
use num_bigint::BigUint;
use std::collections::HashMap;
use std::sync::Arc;
use waypoint_core::{Address, BlockNumber, ChainId, FeeAmount, ProviderError, Token, TradeType};

use crate::state::{GasCost, PoolSummary, RawQuote, Route, RouteQuote, TradablePool};

/// Indexed pool universe
#[async_trait]
pub trait PoolUniverseSource: Send + Sync {
    async fn get_pools(&self, block: Option<BlockNumber>) -> Result<Vec<PoolSummary>, ProviderError>;
}

/// Tokens excluded from routing
#[async_trait]
pub trait TokenBlocklist: Send + Sync {
    async fn is_blocked(&self, address: &Address) -> Result<bool, ProviderError>;
}

/// Token metadata lookup. Unknown addresses are simply absent from the map.
#[async_trait]
pub trait TokenResolver: Send + Sync {
    async fn resolve(
        &self,
        addresses: &[Address],
        block: Option<BlockNumber>,
    ) -> Result<HashMap<Address, Token>, ProviderError>;
}

/// Materialized pools for one routing call
pub trait PoolAccessor: Send + Sync {
    fn all_pools(&self) -> Vec<TradablePool>;

    fn pool_address(&self, token_a: &Token, token_b: &Token, fee: FeeAmount) -> Address;

    fn pool(&self, token_a: &Token, token_b: &Token, fee: FeeAmount) -> Option<TradablePool>;
}

/// Fetches on-chain state for candidate pairs. Pairs with no deployed pool
/// are left out of the accessor.
#[async_trait]
pub trait PoolStateProvider: Send + Sync {
    async fn get_pools(
        &self,
        pairs: &[(Token, Token, FeeAmount)],
        block: Option<BlockNumber>,
    ) -> Result<Arc<dyn PoolAccessor>, ProviderError>;
}

/// Quotes for every (route, amount), in the order given
#[derive(Debug, Clone)]
pub struct QuoteBatch {
    pub routes_with_quotes: Vec<(Route, Vec<RawQuote>)>,
    pub block_number: BlockNumber,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn get_quotes(
        &self,
        amounts: &[BigUint],
        routes: &[Route],
        trade_type: TradeType,
        block: Option<BlockNumber>,
    ) -> Result<QuoteBatch, ProviderError>;
}

#[async_trait]
pub trait GasPriceProvider: Send + Sync {
    async fn gas_price_wei(&self) -> Result<BigUint, ProviderError>;
}

/// Prices the gas of a quoted route in gas units, quote token and USD
pub trait GasModel: Send + Sync {
    fn estimate_gas_cost(&self, quote: &RouteQuote) -> GasCost;
}

#[async_trait]
pub trait GasModelFactory: Send + Sync {
    async fn build(
        &self,
        chain: ChainId,
        gas_price_wei: &BigUint,
        accessor: Arc<dyn PoolAccessor>,
        quote_token: &Token,
    ) -> Result<Arc<dyn GasModel>, ProviderError>;
}

/// The full set of collaborators one router is wired to
#[derive(Clone)]
pub struct RouterProviders {
    pub pool_universe: Arc<dyn PoolUniverseSource>,
    pub blocklist: Option<Arc<dyn TokenBlocklist>>,
    pub token_resolver: Arc<dyn TokenResolver>,
    pub pool_state: Arc<dyn PoolStateProvider>,
    pub quoter: Arc<dyn QuoteProvider>,
    pub gas_price: Arc<dyn GasPriceProvider>,
    pub gas_model_factory: Arc<dyn GasModelFactory>,
}
