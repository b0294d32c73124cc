//! Positional arguments: `oi_ladder [SYMBOL] [LIMIT]`.
use clap::Parser;

pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_LIMIT: i64 = 3;

/// Prints per-expiration call/put open interest ladders as one line of JSON.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Ticker symbol, upper-cased before use.
    #[arg(default_value = DEFAULT_SYMBOL)]
    symbol: String,

    /// How many of the nearest expirations to include. Zero or less selects none.
    #[arg(default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
    pub limit: i64,
}

impl Args {
    pub fn symbol(&self) -> String {
        self.symbol.to_uppercase()
    }
}
