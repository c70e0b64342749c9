//! Pool snapshot files
//!
//! A snapshot is a JSON description of one chain at one block: token
//! metadata, pools with their in-range state, and the gas price. Amounts are
//! decimal strings since they exceed JSON number precision.

use anyhow::{bail, Context, Result};
use num_bigint::BigUint;
use routing::{
    canonical_pool_address, FixedGasPrice, HopGasModelFactory, LocalQuoter, MemoryPoolUniverse,
    PoolSummary, RouterProviders, SimulatedPoolState, StaticBlocklist, StaticTokenList,
    TradablePool,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use waypoint_core::{Address, BlockNumber, ChainId, FeeAmount, Token};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    /// Defaults to the canonical address for the pair and fee. Required for
    /// unsupported fee tiers; must equal the canonical address otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Address>,
    pub token0: Address,
    pub token1: Address,
    pub fee_tier: u32,
    pub tvl_usd: f64,
    pub sqrt_price_x96: String,
    pub liquidity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub chain: ChainId,
    pub block_number: BlockNumber,
    pub gas_price_wei: String,
    pub tokens: Vec<TokenEntry>,
    #[serde(default)]
    pub blocked_tokens: Vec<Address>,
    pub pools: Vec<PoolEntry>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid snapshot {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn token_list(&self) -> StaticTokenList {
        StaticTokenList::new(self.tokens.iter().map(|t| {
            Token::new(self.chain, t.address.clone(), t.symbol.clone(), t.decimals)
        }))
    }

    /// Snapshot-backed providers for every router collaborator.
    ///
    /// Pools whose tokens are unlisted or whose fee tier is unsupported stay
    /// in the universe but have no state, mirroring an indexer that knows
    /// about pools the chain reader cannot price.
    pub fn providers(&self) -> Result<RouterProviders> {
        let tokens = self.token_list();
        let gas_price = parse_amount("gas_price_wei", &self.gas_price_wei)?;

        let mut summaries = Vec::with_capacity(self.pools.len());
        let mut tradable = Vec::with_capacity(self.pools.len());
        for entry in &self.pools {
            let fee = FeeAmount::from_fee_tier(entry.fee_tier);
            // Quotes identify pools by canonical address, so a supported pool
            // must be listed under that same address
            let id = match (&entry.id, fee) {
                (Some(id), Some(fee)) => {
                    let canonical = canonical_pool_address(&entry.token0, &entry.token1, fee);
                    if id != &canonical {
                        bail!(
                            "Pool {}/{} ({}) has id {} but its canonical address is {}",
                            entry.token0,
                            entry.token1,
                            entry.fee_tier,
                            id,
                            canonical
                        );
                    }
                    canonical
                }
                (Some(id), None) => id.clone(),
                (None, Some(fee)) => canonical_pool_address(&entry.token0, &entry.token1, fee),
                (None, None) => bail!(
                    "Pool {}/{} has unsupported fee tier {} and no id",
                    entry.token0,
                    entry.token1,
                    entry.fee_tier
                ),
            };
            summaries.push(PoolSummary {
                id,
                token0: entry.token0.clone(),
                token1: entry.token1.clone(),
                fee_tier: entry.fee_tier,
                tvl_usd: entry.tvl_usd,
            });

            let (Some(fee), Some(token0), Some(token1)) =
                (fee, tokens.get(&entry.token0), tokens.get(&entry.token1))
            else {
                tracing::debug!(
                    "No state for pool {}/{} ({})",
                    entry.token0,
                    entry.token1,
                    entry.fee_tier
                );
                continue;
            };
            tradable.push(TradablePool::new(
                token0.clone(),
                token1.clone(),
                fee,
                parse_amount("sqrt_price_x96", &entry.sqrt_price_x96)?,
                parse_amount("liquidity", &entry.liquidity)?,
            ));
        }

        tracing::info!(
            "Loaded snapshot for {} (chain id {}) at block {}: {} tokens, {} pools ({} priced)",
            self.chain,
            self.chain.id(),
            self.block_number,
            self.tokens.len(),
            summaries.len(),
            tradable.len()
        );

        Ok(RouterProviders {
            pool_universe: Arc::new(MemoryPoolUniverse::new(summaries)),
            blocklist: Some(Arc::new(StaticBlocklist::new(
                self.blocked_tokens.iter().cloned(),
            ))),
            token_resolver: Arc::new(tokens),
            pool_state: Arc::new(SimulatedPoolState::new(tradable)),
            quoter: Arc::new(LocalQuoter::new(self.block_number)),
            gas_price: Arc::new(FixedGasPrice::new(gas_price)),
            gas_model_factory: Arc::new(HopGasModelFactory::default()),
        })
    }
}

/// Parse a decimal integer string
pub fn parse_amount(field: &str, raw: &str) -> Result<BigUint> {
    raw.trim()
        .parse::<BigUint>()
        .with_context(|| format!("{} is not a non-negative integer: {:?}", field, raw))
}
