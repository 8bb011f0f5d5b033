//! Homeward - Pedestrian dead-reckoning simulator

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let argv: Vec<String> = std::env::args().collect();
    let args: Vec<&str> = argv.iter().map(|s| s.as_str()).collect();
    cli::run_cli_main(&args)
}
