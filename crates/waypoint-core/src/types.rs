//! Core type definitions for Waypoint

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::ConfigError;

/// EVM address, stored lower-case with a `0x` prefix.
///
/// Lower-case hex orders the same way as the underlying bytes, so the derived
/// `Ord` is the token ordering pools use for `token0`/`token1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize a 20-byte hex address (with or without `0x`).
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if body.len() != 40 || hex::decode(body).is_err() {
            return Err(ConfigError::InvalidAddress {
                address: raw.to_string(),
            });
        }
        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 20 address bytes.
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        // Validated on construction
        if let Ok(decoded) = hex::decode(&self.0[2..]) {
            out.copy_from_slice(&decoded);
        }
        out
    }
}

impl TryFrom<String> for Address {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Mainnet,
    Optimism,
    Polygon,
    Arbitrum,
}

impl ChainId {
    pub fn id(&self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Optimism => 10,
            Self::Polygon => 137,
            Self::Arbitrum => 42161,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Optimism => "optimism",
            Self::Polygon => "polygon",
            Self::Arbitrum => "arbitrum",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side of the trade is fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    /// Amount is the input; quotes are outputs (maximize)
    ExactInput,
    /// Amount is the output; quotes are required inputs (minimize)
    ExactOutput,
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactInput => write!(f, "exact_input"),
            Self::ExactOutput => write!(f, "exact_output"),
        }
    }
}

/// Pool fee tier in hundredths of a bip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeeAmount {
    Lowest,
    Low,
    Medium,
    High,
}

impl FeeAmount {
    /// All tiers, highest fee first
    pub const ALL: [FeeAmount; 4] = [Self::High, Self::Medium, Self::Low, Self::Lowest];

    /// Parse a raw fee tier (e.g. `3000`). Unsupported tiers return `None`.
    pub fn from_fee_tier(tier: u32) -> Option<Self> {
        match tier {
            100 => Some(Self::Lowest),
            500 => Some(Self::Low),
            3000 => Some(Self::Medium),
            10000 => Some(Self::High),
            _ => None,
        }
    }

    pub fn fee_tier(&self) -> u32 {
        match self {
            Self::Lowest => 100,
            Self::Low => 500,
            Self::Medium => 3000,
            Self::High => 10000,
        }
    }
}

impl fmt::Display for FeeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fee_tier())
    }
}

/// ERC-20 token metadata.
///
/// Identity is `(chain_id, address)`; symbol and decimals are descriptive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: ChainId,
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(chain_id: ChainId, address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            chain_id,
            address,
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Whether this token is `token0` when paired with `other`
    pub fn sorts_before(&self, other: &Token) -> bool {
        self.address < other.address
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain_id.hash(state);
        self.address.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Block number
pub type BlockNumber = u64;
