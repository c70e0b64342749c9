//! Routing Constants
//!
//! Per-chain token sets and pool deployment parameters.

use waypoint_core::{Address, ChainId, Token};

/// (address, symbol, decimals)
type TokenSpec = (&'static str, &'static str, u8);

/// Pool deployment parameters
pub mod deployment {
    /// Pool factory (0x1f98431c8ad98523631ae4a59f267346ea31f984), identical across supported chains
    pub const POOL_FACTORY: [u8; 20] = [
        0x1f, 0x98, 0x43, 0x1c, 0x8a, 0xd9, 0x85, 0x23, 0x63, 0x1a, 0xe4, 0xa5, 0x9f, 0x26, 0x73,
        0x46, 0xea, 0x31, 0xf9, 0x84,
    ];

    /// keccak256 of the pool contract creation code
    pub const POOL_INIT_CODE_HASH: [u8; 32] = [
        0xe3, 0x4f, 0x19, 0x9b, 0x19, 0xb2, 0xb4, 0xf4, 0x7f, 0x68, 0x44, 0x26, 0x19, 0xd5, 0x55,
        0x52, 0x7d, 0x24, 0x4f, 0x78, 0xa3, 0x29, 0x7e, 0xa8, 0x93, 0x25, 0xf8, 0x43, 0xf8, 0x7b,
        0x8b, 0x54,
    ];
}

/// Mainnet tokens
pub mod mainnet {
    use super::TokenSpec;

    pub const WETH: TokenSpec = ("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", "WETH", 18);
    pub const USDC: TokenSpec = ("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "USDC", 6);
    pub const USDT: TokenSpec = ("0xdac17f958d2ee523a2206206994597c13d831ec7", "USDT", 6);
    pub const DAI: TokenSpec = ("0x6b175474e89094c44da98b954eedeac495271d0f", "DAI", 18);
    pub const WBTC: TokenSpec = ("0x2260fac5e5542a773aa44fbcfedf7c193bc2c599", "WBTC", 8);
}

/// Optimism tokens
pub mod optimism {
    use super::TokenSpec;

    pub const WETH: TokenSpec = ("0x4200000000000000000000000000000000000006", "WETH", 18);
    pub const USDC: TokenSpec = ("0x7f5c764cbc14f9669b88837ca1490cca17c31607", "USDC", 6);
    pub const USDT: TokenSpec = ("0x94b008aa00579c1307b0ef2c499ad98a8ce58e58", "USDT", 6);
    pub const DAI: TokenSpec = ("0xda10009cbd5d07dd0cecc66161fc93d7c9000da1", "DAI", 18);
}

/// Polygon tokens
pub mod polygon {
    use super::TokenSpec;

    pub const WMATIC: TokenSpec = ("0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270", "WMATIC", 18);
    pub const WETH: TokenSpec = ("0x7ceb23fd6bc0add59e62ac25578270cff1b9f619", "WETH", 18);
    pub const USDC: TokenSpec = ("0x2791bca1f2de4661ed88a30c99a7a9449aa84174", "USDC", 6);
    pub const USDT: TokenSpec = ("0xc2132d05d31c914a87c6611c10748aeb04b58e8f", "USDT", 6);
    pub const DAI: TokenSpec = ("0x8f3cf7ad23cd3cadbd9735aff958023239c6a063", "DAI", 18);
}

/// Arbitrum tokens
pub mod arbitrum {
    use super::TokenSpec;

    pub const WETH: TokenSpec = ("0x82af49447d8a07e3bd95bd0d56f35241523fbab1", "WETH", 18);
    pub const USDC: TokenSpec = ("0xff970a61a04b1ca14834a43f5de4533ebddb5cc8", "USDC", 6);
    pub const USDT: TokenSpec = ("0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9", "USDT", 6);
    pub const DAI: TokenSpec = ("0xda10009cbd5d07dd0cecc66161fc93d7c9000da1", "DAI", 18);
    pub const WBTC: TokenSpec = ("0x2f2a2543b76a4166549f7aab2e75bef0aefc5b0f", "WBTC", 8);
}

fn to_token(chain: ChainId, spec: &TokenSpec) -> Option<Token> {
    let (address, symbol, decimals) = spec;
    Address::parse(address)
        .ok()
        .map(|address| Token::new(chain, address, *symbol, *decimals))
}

fn to_tokens(chain: ChainId, specs: &[TokenSpec]) -> Vec<Token> {
    specs.iter().filter_map(|s| to_token(chain, s)).collect()
}

/// Major quote assets used to discover indirect paths
pub fn base_tokens(chain: ChainId) -> Vec<Token> {
    match chain {
        ChainId::Mainnet => to_tokens(
            chain,
            &[
                mainnet::USDC,
                mainnet::USDT,
                mainnet::WBTC,
                mainnet::DAI,
                mainnet::WETH,
            ],
        ),
        ChainId::Optimism => to_tokens(
            chain,
            &[optimism::DAI, optimism::USDC, optimism::USDT, optimism::WETH],
        ),
        ChainId::Polygon => to_tokens(
            chain,
            &[polygon::USDC, polygon::WETH, polygon::WMATIC],
        ),
        ChainId::Arbitrum => to_tokens(
            chain,
            &[
                arbitrum::DAI,
                arbitrum::USDC,
                arbitrum::WBTC,
                arbitrum::WETH,
            ],
        ),
    }
}

/// Wrapped form of the chain's gas token
pub fn wrapped_native(chain: ChainId) -> Option<Token> {
    let spec = match chain {
        ChainId::Mainnet => mainnet::WETH,
        ChainId::Optimism => optimism::WETH,
        ChainId::Polygon => polygon::WMATIC,
        ChainId::Arbitrum => arbitrum::WETH,
    };
    to_token(chain, &spec)
}

/// Symbols under which the native asset (wrapped or not) is listed
pub fn native_symbols(chain: ChainId) -> &'static [&'static str] {
    match chain {
        ChainId::Polygon => &["WMATIC", "MATIC"],
        ChainId::Mainnet | ChainId::Optimism | ChainId::Arbitrum => &["WETH", "WETH9", "ETH"],
    }
}

/// Whether `symbol` names the chain's native asset
pub fn is_native_symbol(chain: ChainId, symbol: &str) -> bool {
    native_symbols(chain).contains(&symbol)
}

/// Dollar stablecoins used to express gas cost in USD
pub fn usd_tokens(chain: ChainId) -> Vec<Token> {
    match chain {
        ChainId::Mainnet => to_tokens(chain, &[mainnet::USDC, mainnet::USDT, mainnet::DAI]),
        ChainId::Optimism => to_tokens(chain, &[optimism::USDC, optimism::USDT, optimism::DAI]),
        ChainId::Polygon => to_tokens(chain, &[polygon::USDC, polygon::USDT, polygon::DAI]),
        ChainId::Arbitrum => to_tokens(chain, &[arbitrum::USDC, arbitrum::USDT, arbitrum::DAI]),
    }
}
