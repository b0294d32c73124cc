use crate::config::Config;
use crate::crumb::Crumb;
use crate::provider::{ChainProvider, ChainRow, ChainSnapshot, Expiration, ProviderError};

use async_trait::async_trait;
use reqwest::{Client, Response, Url, header::ACCEPT};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

const CRUMB_PATH: &str = "/v1/test/getcrumb";
const OPTIONS_PATH: &str = "/v7/finance/options";

pub struct YahooClient {
    client: Client,
    base_url: Url,
    cookie_url: Url,
    crumb: Mutex<Option<Crumb>>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorMsg {
    code: String,
    description: String,
}

// Yahoo wraps errors in an envelope named after the endpoint, e.g.
// {"optionChain":{"result":null,"error":{..}}} or {"finance":{..}}
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ServiceErrorMsg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResponse {
    option_chain: OptionChainEnvelope,
}

#[derive(Debug, Deserialize)]
struct OptionChainEnvelope {
    result: Option<Vec<OptionsResult>>,
    error: Option<ServiceErrorMsg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResult {
    underlying_symbol: Option<String>,
    #[serde(default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsBlock {
    expiration_date: Option<i64>,
    #[serde(default)]
    calls: Vec<ContractQuote>,
    #[serde(default)]
    puts: Vec<ContractQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractQuote {
    contract_symbol: Option<String>,
    strike: Option<f64>,
    open_interest: Option<f64>,
}

impl ContractQuote {
    fn to_row(&self) -> ChainRow {
        let open_interest = self
            .open_interest
            .filter(|oi| oi.is_finite())
            .map(|oi| oi.max(0.0) as u64);
        if self.strike.is_none() {
            debug!("contract without strike: {:?}", self.contract_symbol);
        }

        ChainRow::from_fields(self.strike, open_interest)
    }
}

macro_rules! response {
    ($res_type:ident, $res:ident) => {
        match $res.json::<$res_type>().await {
            Ok(data) => data,
            Err(e) => {
                return Err(ProviderError::Service(
                    "MalformedJsonResponse".to_string(),
                    format!("Couldnt parse json response: {e}"),
                ));
            }
        }
    };
}

impl YahooClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .cookie_store(true)
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parse_url(config.base_url())?,
            cookie_url: parse_url(config.cookie_url())?,
            crumb: Mutex::new(None),
        })
    }

    fn make_uri(&self, path: &str) -> Result<Url, ProviderError> {
        match self.base_url.join(path) {
            Ok(uri) => Ok(uri),
            Err(_) => Err(ProviderError::InvalidUri(path.to_string())),
        }
    }

    /// Returns the session crumb, performing the cookie handshake on first use.
    async fn crumb(&self) -> Result<String, ProviderError> {
        let mut session = self.crumb.lock().await;
        if let Some(crumb) = session.as_ref() {
            return Ok(crumb.value().to_string());
        }
        info!("Starting a new yahoo session");

        // only the cookies matter here, fc.yahoo.com answers 404
        let response = self.client.get(self.cookie_url.clone()).send().await;
        if let Err(e) = response {
            return Err(ProviderError::Http(e.to_string()));
        }

        let uri = self.make_uri(CRUMB_PATH)?;
        let response = self.client.get(uri).send().await;
        let response = handle_response(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let fresh = match Crumb::parse(&body) {
            Some(fresh) => fresh,
            None => {
                return Err(ProviderError::Service(
                    "InvalidCrumb".to_string(),
                    "Yahoo did not hand out a crumb".to_string(),
                ));
            }
        };
        debug!("crumb issued at {}", fresh.fetched_at());
        let value = fresh.value().to_string();
        *session = Some(fresh);

        Ok(value)
    }

    /// Options endpoint for `symbol`, pushed as one percent-encoded path segment.
    fn options_uri(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut uri = self.make_uri(OPTIONS_PATH)?;
        uri.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUri(OPTIONS_PATH.to_string()))?
            .push(symbol);

        Ok(uri)
    }

    /// Makes a GET request to the specified endpoint with the session crumb
    async fn get(&self, uri: Url, query: &[(&str, String)]) -> Result<Response, ProviderError> {
        let crumb = self.crumb().await?;

        let response = self
            .client
            .get(uri)
            .query(query)
            .query(&[("crumb", crumb)])
            .header(ACCEPT, "application/json")
            .send()
            .await;

        handle_response(response).await
    }

    async fn get_options(
        &self,
        symbol: &str,
        date: Option<i64>,
    ) -> Result<OptionsResult, ProviderError> {
        let uri = self.options_uri(symbol)?;
        let query: Vec<(&str, String)> = date
            .map(|ts| vec![("date", ts.to_string())])
            .unwrap_or_default();

        let res = match self.get(uri, &query).await {
            Ok(res) => res,
            Err(ProviderError::Service(code, _)) if code == "Not Found" => {
                return Err(ProviderError::SymbolNotFound(symbol.to_string()));
            }
            Err(e) => return Err(e),
        };
        let data = response!(OptionsResponse, res);

        if let Some(msg) = data.option_chain.error {
            return Err(ProviderError::Service(msg.code, msg.description));
        }

        let result = data
            .option_chain
            .result
            .and_then(|results| results.into_iter().next());
        match result {
            Some(result) => {
                debug!(
                    "options for {:?}: {} expirations",
                    result.underlying_symbol,
                    result.expiration_dates.len()
                );
                Ok(result)
            }
            None => Err(ProviderError::SymbolNotFound(symbol.to_string())),
        }
    }
}

#[async_trait]
impl ChainProvider for YahooClient {
    async fn list_expirations(&self, symbol: &str) -> Result<Vec<Expiration>, ProviderError> {
        let result = self.get_options(symbol, None).await?;

        result
            .expiration_dates
            .into_iter()
            .map(Expiration::from_timestamp)
            .collect()
    }

    async fn get_chain(
        &self,
        symbol: &str,
        expiration: &Expiration,
    ) -> Result<ChainSnapshot, ProviderError> {
        let result = match self.get_options(symbol, Some(expiration.timestamp)).await {
            Ok(result) => result,
            Err(ProviderError::SymbolNotFound(_)) => {
                return Err(ProviderError::ChainNotFound {
                    symbol: symbol.to_string(),
                    date: expiration.date.clone(),
                });
            }
            Err(e) => return Err(e),
        };

        let Some(block) = result.options.into_iter().next() else {
            debug!("no contracts listed for {symbol} {}", expiration.date);
            return Ok(ChainSnapshot::default());
        };
        if block.expiration_date.is_some_and(|ts| ts != expiration.timestamp) {
            debug!(
                "asked for {} but got chain for {:?}",
                expiration.timestamp, block.expiration_date
            );
        }

        Ok(ChainSnapshot {
            calls: block.calls.iter().map(ContractQuote::to_row).collect(),
            puts: block.puts.iter().map(ContractQuote::to_row).collect(),
        })
    }
}

fn parse_url(url: &str) -> Result<Url, ProviderError> {
    url.parse()
        .map_err(|_| ProviderError::InvalidUri(url.to_string()))
}

pub async fn handle_response(
    response: Result<Response, reqwest::Error>,
) -> Result<Response, ProviderError> {
    debug!("response: <{response:?}>");

    let response = match response {
        Ok(response) => response,
        Err(e) => return Err(ProviderError::Http(e.to_string())),
    };

    if !response.status().is_success() {
        let status = response.status();
        let msg = response
            .json::<HashMap<String, ErrorEnvelope>>()
            .await
            .ok()
            .and_then(|body| body.into_values().find_map(|envelope| envelope.error));

        return match msg {
            Some(msg) => Err(ProviderError::Service(msg.code, msg.description)),
            None => Err(ProviderError::Service(
                "MalformedErrorResponse".to_string(),
                format!("Couldnt parse server error json response ({status})"),
            )),
        };
    }

    Ok(response)
}
