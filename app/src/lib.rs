//! Waypoint command-line application

pub mod cli;
pub mod report;
pub mod snapshot;

use anyhow::{anyhow, Context, Result};
use routing::SplitRouter;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use waypoint_core::{Address, RoutingConfig, Token, TradeType};

use cli::Cli;
use report::SwapReport;
use snapshot::{parse_amount, Snapshot};

/// Log to stderr so stdout carries only the report
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter()?)
        .init();
    Ok(())
}

/// Debug for the app and the routing engine, info for everything else
pub fn log_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("waypoint=debug".parse()?)
        .add_directive("waypoint_app=debug".parse()?)
        .add_directive("routing=debug".parse()?)
        .add_directive("info".parse()?))
}

/// Route the requested swap and print the report
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("Loading snapshot from {}", cli.snapshot.display());
    let snapshot = Snapshot::load(&cli.snapshot)?;

    match route_snapshot(&snapshot, &cli).await? {
        Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
        None => println!("No route found from {} to {}", cli.token_in, cli.token_out),
    }
    Ok(())
}

pub async fn route_snapshot(snapshot: &Snapshot, cli: &Cli) -> Result<Option<SwapReport>> {
    let token_in = resolve_token(snapshot, &cli.token_in)?;
    let token_out = resolve_token(snapshot, &cli.token_out)?;
    let amount = parse_amount("amount", &cli.amount)?;

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RoutingConfig::for_chain(snapshot.chain),
    };
    if cli.block.is_some() {
        config.block_number = cli.block;
    }

    let trade_type = if cli.exact_output {
        TradeType::ExactOutput
    } else {
        TradeType::ExactInput
    };
    let (amount_token, quote_token) = match trade_type {
        TradeType::ExactInput => (&token_in, &token_out),
        TradeType::ExactOutput => (&token_out, &token_in),
    };

    let router = SplitRouter::new(snapshot.chain, snapshot.providers()?);
    let swap = router
        .route(&amount, amount_token, quote_token, trade_type, &config)
        .await
        .context("Routing failed")?;

    Ok(swap.as_ref().map(SwapReport::from))
}

/// Look a token up by address, falling back to a case-insensitive symbol match
fn resolve_token(snapshot: &Snapshot, raw: &str) -> Result<Token> {
    let tokens = snapshot.token_list();
    if let Ok(address) = Address::parse(raw) {
        return tokens
            .get(&address)
            .cloned()
            .ok_or_else(|| anyhow!("Token {} is not listed in the snapshot", address));
    }

    let mut matches = snapshot
        .tokens
        .iter()
        .filter(|t| t.symbol.eq_ignore_ascii_case(raw));
    match (matches.next(), matches.next()) {
        (Some(entry), None) => tokens
            .get(&entry.address)
            .cloned()
            .ok_or_else(|| anyhow!("Token {} is not listed in the snapshot", raw)),
        (Some(_), Some(_)) => Err(anyhow!("Symbol {} is ambiguous; pass an address", raw)),
        (None, _) => Err(anyhow!("Unknown token {}", raw)),
    }
}

pub fn load_config(path: &Path) -> Result<RoutingConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

pub fn parse_config(raw: &str) -> Result<RoutingConfig> {
    Ok(serde_json::from_str(raw)?)
}
