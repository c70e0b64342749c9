//! JSON report of a routed swap

use routing::{RouteAmount, SwapRoute};
use serde::Serialize;
use waypoint_core::{BlockNumber, TradeType};

/// One leg of the report; amounts are raw-unit decimal strings
#[derive(Debug, Clone, Serialize)]
pub struct LegReport {
    pub percent: u8,
    pub amount: String,
    pub quote: String,
    pub quote_gas_adjusted: String,
    pub gas_estimate: u64,
    /// Token symbols along the path
    pub path: Vec<String>,
    pub fee_tiers: Vec<u32>,
    pub pools: Vec<String>,
}

impl From<&RouteAmount> for LegReport {
    fn from(leg: &RouteAmount) -> Self {
        Self {
            percent: leg.percent,
            amount: leg.amount.to_string(),
            quote: leg.quote.to_string(),
            quote_gas_adjusted: leg.quote_adjusted_for_gas.to_string(),
            gas_estimate: leg.gas_estimate,
            path: leg
                .route
                .token_path()
                .iter()
                .map(|t| t.symbol.clone())
                .collect(),
            fee_tiers: leg.route.pools.iter().map(|p| p.fee.fee_tier()).collect(),
            pools: leg.pool_addresses.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapReport {
    pub trade_type: TradeType,
    pub block_number: BlockNumber,
    pub amount: String,
    pub quote: String,
    pub quote_gas_adjusted: String,
    pub estimated_gas_used: u64,
    pub estimated_gas_used_quote_token: String,
    pub estimated_gas_used_usd: String,
    pub gas_price_wei: String,
    pub legs: Vec<LegReport>,
}

impl From<&SwapRoute> for SwapReport {
    fn from(swap: &SwapRoute) -> Self {
        Self {
            trade_type: swap.trade_type,
            block_number: swap.block_number,
            amount: swap.amount.to_string(),
            quote: swap.quote.to_string(),
            quote_gas_adjusted: swap.quote_gas_adjusted.to_string(),
            estimated_gas_used: swap.estimated_gas_used,
            estimated_gas_used_quote_token: swap.estimated_gas_used_quote_token.to_string(),
            estimated_gas_used_usd: swap.estimated_gas_used_usd.to_string(),
            gas_price_wei: swap.gas_price_wei.to_string(),
            legs: swap.route.iter().map(LegReport::from).collect(),
        }
    }
}
