//! Core oracle types

use chrono::Utc;
use kresko_core::Wad;
use serde::{Deserialize, Serialize};

use crate::OracleError;

/// A price quote with market status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Feed identifier the quote was read from
    pub feed: String,
    /// USD price, 18 decimals
    pub price: Wad,
    /// Whether the underlying market is currently trading
    pub market_open: bool,
    /// Unix seconds when this price was produced
    pub timestamp: i64,
}

impl PriceQuote {
    /// Create an open-market quote stamped with the current time
    pub fn new(feed: impl Into<String>, price: Wad) -> Self {
        Self {
            feed: feed.into(),
            price,
            market_open: true,
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn with_market_open(mut self, open: bool) -> Self {
        self.market_open = open;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Check if the quote is older than `max_age_secs` at `now`
    pub fn is_stale(&self, now: i64, max_age_secs: u64) -> bool {
        now.saturating_sub(self.timestamp) > max_age_secs as i64
    }
}

/// Price Oracle trait - interface for price feeds
///
/// The engine only reads through this trait and never caches: every
/// valuation asks for a fresh quote.
pub trait PriceOracle: Send + Sync {
    /// Get the current quote for a feed
    fn quote(&self, feed: &str) -> Result<PriceQuote, OracleError>;

    /// Get the current price for a feed
    fn price(&self, feed: &str) -> Result<Wad, OracleError> {
        self.quote(feed).map(|q| q.price)
    }

    /// Whether the market behind the feed is open
    fn is_market_open(&self, feed: &str) -> Result<bool, OracleError> {
        self.quote(feed).map(|q| q.market_open)
    }

    /// Secondary market (AMM) price, if the oracle tracks one
    fn market_price(&self, _feed: &str) -> Option<Wad> {
        None
    }

    /// All feeds this oracle can quote
    fn supported_feeds(&self) -> Vec<String>;

    fn is_supported(&self, feed: &str) -> bool {
        self.supported_feeds().iter().any(|f| f == feed)
    }
}
