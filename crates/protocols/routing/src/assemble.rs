//! Result Assembler
//!
//! Turns the winning split into a [`SwapRoute`] and reports which candidate
//! buckets the winner drew from.

use num_bigint::{BigInt, BigUint};
use std::collections::HashSet;
use waypoint_core::{Address, BlockNumber, TradeType};

use crate::curation::CandidateSelections;
use crate::split::SplitPlan;
use crate::state::{RouteAmount, SwapRoute};

/// Sum a plan into a swap route whose legs add up to exactly `amount`.
///
/// Legs are ordered by descending amount. Percent rounding can only leave
/// the legs short of the total; the deficit goes to the last leg.
pub fn assemble_swap_route(
    plan: SplitPlan,
    amount: &BigUint,
    trade_type: TradeType,
    gas_price_wei: BigUint,
    block_number: BlockNumber,
) -> SwapRoute {
    let mut route: Vec<RouteAmount> = plan.quotes.into_iter().map(RouteAmount::from).collect();

    let quote: BigUint = route.iter().map(|r| &r.quote).sum();
    let quote_gas_adjusted: BigInt = route.iter().map(|r| &r.quote_adjusted_for_gas).sum();
    let estimated_gas_used: u64 = route.iter().map(|r| r.gas_estimate).sum();
    let estimated_gas_used_quote_token: BigUint =
        route.iter().map(|r| &r.gas_cost_in_token).sum();
    let estimated_gas_used_usd: BigUint = route.iter().map(|r| &r.gas_cost_in_usd).sum();

    route.sort_by(|a, b| b.amount.cmp(&a.amount));
    reconcile(&mut route, amount);

    SwapRoute {
        trade_type,
        amount: amount.clone(),
        quote,
        quote_gas_adjusted,
        estimated_gas_used,
        estimated_gas_used_quote_token,
        estimated_gas_used_usd,
        gas_price_wei,
        route,
        block_number,
    }
}

fn reconcile(route: &mut [RouteAmount], total: &BigUint) {
    let sum: BigUint = route.iter().map(|r| &r.amount).sum();
    if &sum >= total {
        return;
    }
    let deficit = total - &sum;
    if let Some(last) = route.last_mut() {
        tracing::info!(
            "Legs sum to {} of {}; adding {} to the {}% leg",
            sum,
            total,
            deficit,
            last.percent
        );
        last.amount += deficit;
    }
}

/// How deep into one candidate bucket the winning route reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSelectionUsage {
    pub bucket: &'static str,
    /// 1-based position of the deepest used pool; 0 if none was used
    pub top_n_used: usize,
}

pub fn pool_selection_usage(
    route: &[RouteAmount],
    selections: &CandidateSelections,
) -> Vec<PoolSelectionUsage> {
    let used: HashSet<&Address> = route.iter().flat_map(|r| r.pool_addresses.iter()).collect();
    selections
        .buckets()
        .into_iter()
        .map(|(bucket, pools)| PoolSelectionUsage {
            bucket,
            top_n_used: pools
                .iter()
                .rposition(|p| used.contains(&p.id))
                .map_or(0, |i| i + 1),
        })
        .collect()
}

/// Log bucket usage along with the chosen legs
pub fn emit_pool_selection_metrics(swap: &SwapRoute, selections: &CandidateSelections) {
    for usage in pool_selection_usage(&swap.route, selections) {
        tracing::info!(
            bucket = usage.bucket,
            top_n_used = usage.top_n_used,
            "Pool selection usage"
        );
    }
    for leg in &swap.route {
        tracing::info!(
            percent = leg.percent,
            amount = %leg.amount,
            quote = %leg.quote,
            "Leg {}",
            leg.route
        );
    }
}
