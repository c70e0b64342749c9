//! Path Enumerator
//!
//! Depth-bounded DFS over candidate pools producing every simple pool path
//! from token in to token out.

use waypoint_core::Token;

use crate::state::{Route, TradablePool};

/// All pool sequences of length `1..=max_hops` from `token_in` to `token_out`
/// with no pool repeated.
///
/// A branch stops as soon as its last pool touches `token_out`.
pub fn compute_all_routes(
    token_in: &Token,
    token_out: &Token,
    pools: &[TradablePool],
    max_hops: usize,
) -> Vec<Route> {
    let mut routes = Vec::new();
    let mut used = vec![false; pools.len()];
    let mut current: Vec<TradablePool> = Vec::with_capacity(max_hops);

    extend_routes(
        token_in,
        token_out,
        pools,
        max_hops,
        &mut used,
        &mut current,
        token_in,
        &mut routes,
    );

    tracing::debug!(
        "Computed {} routes from {} to {} over {} pools (max {} hops)",
        routes.len(),
        token_in,
        token_out,
        pools.len(),
        max_hops
    );

    routes
}

#[allow(clippy::too_many_arguments)]
fn extend_routes(
    token_in: &Token,
    token_out: &Token,
    pools: &[TradablePool],
    max_hops: usize,
    used: &mut [bool],
    current: &mut Vec<TradablePool>,
    frontier: &Token,
    routes: &mut Vec<Route>,
) {
    if current.len() > max_hops {
        return;
    }

    if let Some(last) = current.last() {
        if last.involves_token(token_out) {
            routes.push(Route::new(current.clone(), token_in.clone(), token_out.clone()));
            return;
        }
    }

    if current.len() == max_hops {
        return;
    }

    for i in 0..pools.len() {
        if used[i] {
            continue;
        }
        let pool = &pools[i];
        let Some(next) = pool.other_token(frontier) else {
            continue;
        };
        let next = next.clone();

        used[i] = true;
        current.push(pool.clone());
        extend_routes(
            token_in, token_out, pools, max_hops, used, current, &next, routes,
        );
        current.pop();
        used[i] = false;
    }
}
