//! Split-Route Swap Router
//!
//! This crate finds the best way to execute a swap across concentrated
//! liquidity pools, splitting the trade over up to three pool-disjoint
//! paths when that beats any single path after gas.

pub mod assemble;
pub mod constants;
pub mod curation;
pub mod distribution;
pub mod memory;
pub mod paths;
pub mod providers;
pub mod router;
pub mod split;
pub mod state;

// Re-exports
pub use assemble::{
    assemble_swap_route, emit_pool_selection_metrics, pool_selection_usage, PoolSelectionUsage,
};
pub use curation::{get_candidate_pools, select_candidate_pools, CandidatePools, CandidateSelections};
pub use distribution::{amount_distribution, AmountDistribution};
pub use memory::{
    FixedGasPrice, HopGasCosts, HopGasModel, HopGasModelFactory, LocalQuoter, MemoryPoolUniverse,
    SimulatedPoolAccessor, SimulatedPoolState, StaticBlocklist, StaticTokenList,
};
pub use paths::compute_all_routes;
pub use providers::{
    GasModel, GasModelFactory, GasPriceProvider, PoolAccessor, PoolStateProvider,
    PoolUniverseSource, QuoteBatch, QuoteProvider, RouterProviders, TokenBlocklist, TokenResolver,
};
pub use router::SplitRouter;
pub use split::{best_swap_route, bucket_by_percent, SplitPlan, SplitSearch, TopSplits};
pub use state::{
    canonical_pool_address, compute_pool_address, GasCost, PoolSummary, RawQuote, Route,
    RouteAmount, RouteQuote, SwapRoute, TradablePool, ValidatedRouteQuote,
};
