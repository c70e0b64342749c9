//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "waypoint")]
#[command(about = "Find the best split route for a swap over a pool snapshot", long_about = None)]
pub struct Cli {
    /// Pool snapshot to route over
    #[arg(long, value_name = "FILE", env = "WAYPOINT_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Token sold, as an address or a symbol listed in the snapshot
    #[arg(long)]
    pub token_in: String,

    /// Token bought, as an address or a symbol listed in the snapshot
    #[arg(long)]
    pub token_out: String,

    /// Raw-unit amount of token in, or of token out with --exact-output
    #[arg(long)]
    pub amount: String,

    /// Treat --amount as the exact output to receive
    #[arg(long)]
    pub exact_output: bool,

    /// Routing config JSON; defaults are tuned per chain
    #[arg(long, value_name = "FILE", env = "WAYPOINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pin the call to this block
    #[arg(long)]
    pub block: Option<u64>,
}
