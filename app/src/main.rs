use clap::Parser;
use waypoint_app::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    waypoint_app::init_tracing()?;
    waypoint_app::run(cli).await
}
