use async_trait::async_trait;
use chrono::DateTime;
use thiserror::Error;

/// Open interest the provider leaves undefined; counts as zero contracts.
/// Applied by [`ChainRow::from_fields`].
pub const MISSING_OPEN_INTEREST: u64 = 0;

/// Strike the provider leaves undefined or non-finite. The row stays on the
/// ladder at this price level. Applied by [`ChainRow::from_fields`].
pub const MISSING_STRIKE: f64 = 0.0;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("symbol {0} has no option chain")]
    SymbolNotFound(String),
    #[error("no chain returned for {symbol} expiring {date}")]
    ChainNotFound { symbol: String, date: String },
    #[error("service error {0}: {1}")]
    Service(String, String),
    #[error("http error: {0}")]
    Http(String),
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    #[error("expiration timestamp {0} is out of range")]
    InvalidExpiration(i64),
}

/// One dated option chain snapshot as addressed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiration {
    /// Calendar date of the expiry, `YYYY-MM-DD`.
    pub date: String,
    /// Epoch seconds the provider uses to address this chain.
    pub timestamp: i64,
}

impl Expiration {
    pub fn from_timestamp(timestamp: i64) -> Result<Self, ProviderError> {
        let date = DateTime::from_timestamp(timestamp, 0)
            .ok_or(ProviderError::InvalidExpiration(timestamp))?
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();

        Ok(Self { date, timestamp })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainRow {
    pub strike: f64,
    pub open_interest: u64,
}

impl ChainRow {
    pub fn new(strike: f64, open_interest: u64) -> Self {
        Self {
            strike,
            open_interest,
        }
    }

    /// Builds a row from loosely typed provider fields, filling undefined
    /// values with [`MISSING_STRIKE`] and [`MISSING_OPEN_INTEREST`].
    pub fn from_fields(strike: Option<f64>, open_interest: Option<u64>) -> Self {
        let strike = strike.filter(|s| s.is_finite()).unwrap_or(MISSING_STRIKE);
        let open_interest = open_interest.unwrap_or(MISSING_OPEN_INTEREST);

        Self::new(strike, open_interest)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainSnapshot {
    pub calls: Vec<ChainRow>,
    pub puts: Vec<ChainRow>,
}

/// Market data source able to list expirations and fetch one chain at a time.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn list_expirations(&self, symbol: &str) -> Result<Vec<Expiration>, ProviderError>;

    async fn get_chain(
        &self,
        symbol: &str,
        expiration: &Expiration,
    ) -> Result<ChainSnapshot, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_from_timestamp() {
        let exp = Expiration::from_timestamp(1718928000).unwrap();
        assert_eq!(exp.date, "2024-06-21");
        assert_eq!(exp.timestamp, 1718928000);
    }

    #[test]
    fn test_expiration_out_of_range() {
        assert!(matches!(
            Expiration::from_timestamp(i64::MAX),
            Err(ProviderError::InvalidExpiration(_))
        ));
    }

    #[test]
    fn test_missing_open_interest_is_zero() {
        let row = ChainRow::from_fields(Some(105.0), None);
        assert_eq!(row, ChainRow::new(105.0, 0));
    }

    #[test]
    fn test_missing_strike_is_zero() {
        assert_eq!(ChainRow::from_fields(None, Some(3)), ChainRow::new(0.0, 3));
        assert_eq!(
            ChainRow::from_fields(Some(f64::NAN), Some(12)),
            ChainRow::new(0.0, 12)
        );
        assert_eq!(ChainRow::from_fields(None, None), ChainRow::new(0.0, 0));
    }
}
