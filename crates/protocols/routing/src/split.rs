//! Split-Route Optimizer
//!
//! Picks the best combination of pool-disjoint routes whose percents sum to
//! 100, searching 1-, 2- and 3-way splits of gas-adjusted quotes.

use num_bigint::BigInt;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashSet};
use waypoint_core::{Address, RoutingConfig, RoutingError, TradeType, MAX_SUPPORTED_SPLITS};

use crate::state::ValidatedRouteQuote;

/// Quotes keyed by percent, each bucket best-first
pub type PercentBuckets = BTreeMap<u8, Vec<ValidatedRouteQuote>>;

/// Winning combination. Percents sum to 100 and no pool appears twice.
#[derive(Debug, Clone)]
pub struct SplitPlan {
    pub quotes: Vec<ValidatedRouteQuote>,
}

impl SplitPlan {
    pub fn splits(&self) -> usize {
        self.quotes.len()
    }

    pub fn percent_total(&self) -> u32 {
        self.quotes.iter().map(|q| u32::from(q.percent)).sum()
    }

    pub fn quote_adjusted_for_gas(&self) -> BigInt {
        self.quotes.iter().map(|q| &q.quote_adjusted_for_gas).sum()
    }
}

/// Larger is better regardless of trade type
fn objective(quote_adjusted_for_gas: BigInt, trade_type: TradeType) -> BigInt {
    match trade_type {
        TradeType::ExactInput => quote_adjusted_for_gas,
        TradeType::ExactOutput => -quote_adjusted_for_gas,
    }
}

/// Group quotes by percent, sorting each group best-first. Ties keep input order.
pub fn bucket_by_percent(quotes: Vec<ValidatedRouteQuote>, trade_type: TradeType) -> PercentBuckets {
    let mut buckets = PercentBuckets::new();
    for quote in quotes {
        buckets.entry(quote.percent).or_default().push(quote);
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by_cached_key(|q| Reverse(objective(q.quote_adjusted_for_gas.clone(), trade_type)));
    }
    buckets
}

/// Find the best split over `quotes`.
///
/// Returns `Ok(None)` when no route was quoted at 100%. The 2-way search
/// always runs when `max_splits >= 2`; each further degree runs only if the
/// previous one improved the plan.
pub fn best_swap_route(
    percents: &[u8],
    quotes: Vec<ValidatedRouteQuote>,
    trade_type: TradeType,
    config: &RoutingConfig,
) -> Result<Option<SplitPlan>, RoutingError> {
    // ------- Step 1: bucket -------
    let buckets = bucket_by_percent(quotes, trade_type);
    let search = SplitSearch::new(percents, &buckets, trade_type, config.split_diagnostics_top_k);

    // ------- Step 2: single route baseline -------
    let Some(baseline) = search.best_at(100) else {
        tracing::info!("No valid quote for 100% of the amount; no route");
        return Ok(None);
    };
    let mut best = vec![baseline];
    let mut best_key = search.key(&best);

    // ------- Steps 3-5: widen the split while it keeps improving -------
    let mut splits = 2;
    while splits <= config.max_splits {
        if let Some((combo, key)) = search.search_degree(splits, &best_key)? {
            best = combo;
            best_key = key;
        }
        splits += 1;
        if best.len() < splits - 1 {
            break;
        }
    }

    tracing::info!("Best plan: {}", describe(&best));
    Ok(Some(SplitPlan {
        quotes: best.into_iter().cloned().collect(),
    }))
}

type Combo<'a> = Vec<&'a ValidatedRouteQuote>;

/// Search state over one call's buckets
pub struct SplitSearch<'a> {
    /// Ascending, deduplicated
    percents: Vec<u8>,
    buckets: &'a PercentBuckets,
    trade_type: TradeType,
    top_k: usize,
}

impl<'a> SplitSearch<'a> {
    pub fn new(
        percents: &[u8],
        buckets: &'a PercentBuckets,
        trade_type: TradeType,
        top_k: usize,
    ) -> Self {
        let mut percents = percents.to_vec();
        percents.sort_unstable();
        percents.dedup();
        Self {
            percents,
            buckets,
            trade_type,
            top_k,
        }
    }

    pub fn key(&self, combo: &[&ValidatedRouteQuote]) -> BigInt {
        let total: BigInt = combo.iter().map(|q| &q.quote_adjusted_for_gas).sum();
        objective(total, self.trade_type)
    }

    /// Best combination of exactly `splits` routes that beats `current`
    pub fn search_degree(
        &self,
        splits: usize,
        current: &BigInt,
    ) -> Result<Option<(Combo<'a>, BigInt)>, RoutingError> {
        match splits {
            2 => Ok(self.two_way(current)),
            3 => Ok(self.three_way(current)),
            _ => {
                tracing::error!(
                    "Split search reached {} routes; only {} are supported",
                    splits,
                    MAX_SUPPORTED_SPLITS
                );
                Err(RoutingError::UnsupportedSplitDegree { splits })
            }
        }
    }

    fn best_at(&self, percent: u8) -> Option<&'a ValidatedRouteQuote> {
        self.buckets.get(&percent).and_then(|b| b.first())
    }

    /// First quote at `percent`, in priority order, sharing no pool with `used`
    fn first_disjoint(
        &self,
        percent: u8,
        used: &[&ValidatedRouteQuote],
    ) -> Option<&'a ValidatedRouteQuote> {
        let used: HashSet<Address> = used
            .iter()
            .flat_map(|q| q.pool_addresses.iter().cloned())
            .collect();
        self.buckets
            .get(&percent)?
            .iter()
            .find(|q| !q.uses_any_pool(&used))
    }

    fn two_way(&self, current: &BigInt) -> Option<(Combo<'a>, BigInt)> {
        let mut top = TopSplits::new(self.top_k);
        let mut best: Option<(Combo<'a>, BigInt)> = None;

        for &percent_a in self.percents.iter().rev() {
            let Some(a) = self.best_at(percent_a) else {
                continue;
            };
            let Some(percent_b) = remaining(&[percent_a]) else {
                continue;
            };
            let Some(b) = self.first_disjoint(percent_b, &[a]) else {
                continue;
            };

            let combo = vec![a, b];
            let key = self.key(&combo);
            top.offer(&key, &combo);
            let bar = best.as_ref().map_or(current, |(_, k)| k);
            if key > *bar {
                best = Some((combo, key));
            }
        }

        top.log(2);
        best
    }

    fn three_way(&self, current: &BigInt) -> Option<(Combo<'a>, BigInt)> {
        let mut top = TopSplits::new(self.top_k.min(3));
        let mut best: Option<(Combo<'a>, BigInt)> = None;

        for i in (0..self.percents.len()).rev() {
            let percent_a = self.percents[i];
            let Some(a) = self.best_at(percent_a) else {
                continue;
            };
            for j in (0..i).rev() {
                let percent_b = self.percents[j];
                let Some(b) = self.first_disjoint(percent_b, &[a]) else {
                    continue;
                };
                let Some(percent_c) = remaining(&[percent_a, percent_b]) else {
                    continue;
                };
                let Some(c) = self.first_disjoint(percent_c, &[a, b]) else {
                    continue;
                };

                let combo = vec![a, b, c];
                let key = self.key(&combo);
                top.offer(&key, &combo);
                let bar = best.as_ref().map_or(current, |(_, k)| k);
                if key > *bar {
                    best = Some((combo, key));
                }
            }
        }

        top.log(3);
        best
    }
}

/// Percent left after `taken`, if positive
fn remaining(taken: &[u8]) -> Option<u8> {
    taken
        .iter()
        .try_fold(100u8, |left, p| left.checked_sub(*p))
        .filter(|left| *left > 0)
}

fn describe(combo: &[&ValidatedRouteQuote]) -> String {
    combo
        .iter()
        .map(|q| format!("{}% [{}]", q.percent, q.route))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Bounded record of the best combinations seen. Diagnostics only.
pub struct TopSplits {
    k: usize,
    heap: BinaryHeap<Reverse<(BigInt, String)>>,
}

impl TopSplits {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    pub fn offer(&mut self, key: &BigInt, combo: &[&ValidatedRouteQuote]) {
        if self.k == 0 {
            return;
        }
        self.heap.push(Reverse((key.clone(), describe(combo))));
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Retained combinations, best first
    pub fn into_best_first(self) -> Vec<(BigInt, String)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(entry)| entry)
            .collect()
    }

    fn log(self, splits: usize) {
        for (rank, (key, label)) in self.into_best_first().into_iter().enumerate() {
            tracing::debug!(splits, rank = rank + 1, objective = %key, "Top split: {}", label);
        }
    }
}
