use chrono::{DateTime, Utc};
use tracing::debug;

/// Anti-forgery token Yahoo pairs with the session cookies. Held for the
/// lifetime of one client; never written to disk.
#[derive(Debug, Clone)]
pub struct Crumb {
    value: String,
    fetched_at: DateTime<Utc>,
}

impl Crumb {
    /// Returns `None` for a blank body, which Yahoo sends when the cookie
    /// handshake did not take.
    pub fn parse(body: &str) -> Option<Crumb> {
        let value = body.trim();
        if value.is_empty() || value.contains(char::is_whitespace) || value.starts_with('{') {
            debug!("rejecting crumb body <{body}>");
            return None;
        }

        Some(Crumb {
            value: value.to_string(),
            fetched_at: Utc::now(),
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}
