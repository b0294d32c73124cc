pub mod cli;
pub mod config;
pub mod crumb;
pub mod ladder;
pub mod provider;
pub mod report;
pub mod yahoo;

const CONFIG_DIR: &str = ".oi_ladder";
const CONFIG_FILE: &str = "config.toml";
const CONFIG_ENV: &str = "OI_LADDER_CONFIG";
const YAHOO_API: &str = "https://query2.finance.yahoo.com";
const YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
