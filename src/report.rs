use serde::Serialize;
use tracing::info;

use crate::ladder::ExpiryLadder;
use crate::provider::{ChainProvider, Expiration, ProviderError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReport {
    pub symbol: String,
    pub expirations: Vec<String>,
    pub per_expiry: Vec<ExpiryLadder>,
}

impl ChainReport {
    /// Fetches the first `limit` expirations of `symbol` one after another and
    /// lays each chain out as a strike ladder.
    pub async fn build<P>(provider: &P, symbol: &str, limit: i64) -> Result<Self, ProviderError>
    where
        P: ChainProvider + ?Sized,
    {
        let available = provider.list_expirations(symbol).await?;
        let selected = select_expirations(available, limit);
        info!("{symbol}: building ladders for {} expirations", selected.len());

        let mut per_expiry = Vec::with_capacity(selected.len());
        for expiration in &selected {
            let snapshot = provider.get_chain(symbol, expiration).await?;
            per_expiry.push(ExpiryLadder::from_snapshot(&expiration.date, &snapshot));
        }

        Ok(Self {
            symbol: symbol.to_string(),
            expirations: selected.into_iter().map(|e| e.date).collect(),
            per_expiry,
        })
    }
}

/// Keeps the provider's first `limit` expirations. A non-positive limit selects
/// nothing and a limit past the end selects everything.
pub fn select_expirations(mut expirations: Vec<Expiration>, limit: i64) -> Vec<Expiration> {
    let keep = usize::try_from(limit).unwrap_or(0);
    expirations.truncate(keep);
    expirations
}
