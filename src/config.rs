use serde::Deserialize;
use tokio::fs;
use tracing::{debug, warn};

use super::{CONFIG_DIR, CONFIG_ENV, CONFIG_FILE, USER_AGENT, YAHOO_API, YAHOO_COOKIE_URL};
use std::{env, io::ErrorKind, path::PathBuf};

/// Provider endpoints and client identity. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub base_url: Option<String>,
    pub cookie_url: Option<String>,
    pub user_agent: Option<String>,
}

impl Config {
    /// Reads the config file, falling back to defaults when it is missing or
    /// unusable.
    pub async fn load() -> Config {
        let path = config_path();
        debug!("finding config in {path:?}");
        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no config at {path:?}, using defaults");
                return Config::default();
            }
            Err(e) => {
                warn!("could not read {path:?}: {e}");
                return Config::default();
            }
        };

        match Self::from_str(data.as_str()) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring malformed config {path:?}: {e}");
                Config::default()
            }
        }
    }

    fn from_str(data: &str) -> Result<Config, toml::de::Error> {
        toml::from_str::<Config>(data)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(YAHOO_API)
    }

    pub fn cookie_url(&self) -> &str {
        self.cookie_url.as_deref().unwrap_or(YAHOO_COOKIE_URL)
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(USER_AGENT)
    }
}

fn config_path() -> PathBuf {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    let home_dir = env::home_dir().unwrap_or(PathBuf::new());

    home_dir.join(PathBuf::from(format!("{CONFIG_DIR}/{CONFIG_FILE}")))
}
