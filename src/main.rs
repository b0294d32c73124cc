use anyhow::{Context, Result};
use clap::Parser;
use oi_ladder::{cli::Args, config::Config, report::ChainReport, yahoo::YahooClient};
use std::io::{self, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .init();

    let symbol = args.symbol();
    info!("Open interest ladder for {symbol}, limit {}", args.limit);

    let config = Config::load().await;
    let client = YahooClient::new(&config).context("Failed to create yahoo client")?;

    let report = ChainReport::build(&client, &symbol, args.limit)
        .await
        .with_context(|| format!("Failed to fetch option chains for {symbol}"))?;

    let report_str = serde_json::to_string(&report).context("Failed to serialize report")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{report_str}")?;
    stdout.flush()?;

    Ok(())
}
