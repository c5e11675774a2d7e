//! Mock Oracle for tests and the CLI simulator
//!
//! Provides configurable fixed prices and market status.

use kresko_core::Wad;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::error::OracleError;
use crate::types::{PriceOracle, PriceQuote};

/// Mock Price Oracle
///
/// Stores quotes that can be updated programmatically through a shared
/// reference, so tests can move prices while the protocol holds the oracle.
#[derive(Default)]
pub struct MockOracle {
    /// Stored quotes (feed -> quote)
    quotes: RwLock<HashMap<String, PriceQuote>>,
    /// Optional secondary market prices (feed -> price)
    market_prices: RwLock<HashMap<String, Wad>>,
}

impl MockOracle {
    /// Create a new empty mock oracle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock oracle from a set of quotes (e.g. a persisted snapshot)
    pub fn from_quotes(quotes: impl IntoIterator<Item = PriceQuote>) -> Self {
        let oracle = Self::new();
        {
            let mut map = oracle.write_quotes();
            for quote in quotes {
                map.insert(quote.feed.clone(), quote);
            }
        }
        oracle
    }

    /// Set a price, keeping the feed's current market status (open if new)
    pub fn set_price(&self, feed: &str, price: Wad) {
        let mut quotes = self.write_quotes();
        let open = quotes.get(feed).map(|q| q.market_open).unwrap_or(true);
        debug!(feed, price = %price, "Mock price set");
        quotes.insert(
            feed.to_string(),
            PriceQuote::new(feed, price).with_market_open(open),
        );
    }

    /// Open or close the market behind a feed
    pub fn set_market_open(&self, feed: &str, open: bool) -> Result<(), OracleError> {
        let mut quotes = self.write_quotes();
        let quote = quotes.get_mut(feed).ok_or_else(|| OracleError::FeedNotFound {
            feed: feed.to_string(),
        })?;
        quote.market_open = open;
        Ok(())
    }

    /// Set the secondary market price used for stability rate pricing
    pub fn set_market_price(&self, feed: &str, price: Wad) {
        self.market_prices
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(feed.to_string(), price);
    }

    /// Remove a feed (for testing feed-not-found errors)
    pub fn remove_feed(&self, feed: &str) {
        self.write_quotes().remove(feed);
    }

    /// All quotes, sorted by feed
    pub fn snapshot(&self) -> Vec<PriceQuote> {
        let mut quotes: Vec<_> = self.read_quotes().values().cloned().collect();
        quotes.sort_by(|a, b| a.feed.cmp(&b.feed));
        quotes
    }

    /// Get number of configured feeds
    pub fn feed_count(&self) -> usize {
        self.read_quotes().len()
    }

    fn read_quotes(&self) -> RwLockReadGuard<'_, HashMap<String, PriceQuote>> {
        self.quotes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_quotes(&self) -> RwLockWriteGuard<'_, HashMap<String, PriceQuote>> {
        self.quotes.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl PriceOracle for MockOracle {
    fn quote(&self, feed: &str) -> Result<PriceQuote, OracleError> {
        let quote = self
            .read_quotes()
            .get(feed)
            .cloned()
            .ok_or_else(|| OracleError::FeedNotFound {
                feed: feed.to_string(),
            })?;
        if quote.price.is_zero() {
            return Err(OracleError::InvalidPrice {
                feed: feed.to_string(),
                reason: "zero price".to_string(),
            });
        }
        Ok(quote)
    }

    fn market_price(&self, feed: &str) -> Option<Wad> {
        self.market_prices
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(feed)
            .copied()
    }

    fn supported_feeds(&self) -> Vec<String> {
        self.read_quotes().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wad(s: &str) -> Wad {
        s.parse().unwrap()
    }

    #[test]
    fn test_mock_oracle_set_price() {
        let oracle = MockOracle::new();

        // Initially not set
        assert!(oracle.quote("DOGE/USD").is_err());

        oracle.set_price("DOGE/USD", wad("0.08"));

        let quote = oracle.quote("DOGE/USD").unwrap();
        assert_eq!(quote.price, wad("0.08"));
        assert!(quote.market_open);
    }

    #[test]
    fn test_mock_oracle_feed_not_found() {
        let oracle = MockOracle::new();
        let result = oracle.quote("UNKNOWN/USD");
        assert!(matches!(result, Err(OracleError::FeedNotFound { .. })));
        assert!(oracle.set_market_open("UNKNOWN/USD", false).is_err());
    }

    #[test]
    fn test_mock_oracle_zero_price_rejected() {
        let oracle = MockOracle::new();
        oracle.set_price("ETH/USD", Wad::ZERO);
        assert!(matches!(
            oracle.price("ETH/USD"),
            Err(OracleError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_market_status_survives_price_update() {
        let oracle = MockOracle::new();
        oracle.set_price("TSLA/USD", wad("700"));
        oracle.set_market_open("TSLA/USD", false).unwrap();

        oracle.set_price("TSLA/USD", wad("710"));
        assert!(!oracle.is_market_open("TSLA/USD").unwrap());
        assert_eq!(oracle.price("TSLA/USD").unwrap(), wad("710"));
    }

    #[test]
    fn test_market_price() {
        let oracle = MockOracle::new();
        oracle.set_price("krETH/USD", wad("1800"));
        assert_eq!(oracle.market_price("krETH/USD"), None);

        oracle.set_market_price("krETH/USD", wad("1750"));
        assert_eq!(oracle.market_price("krETH/USD"), Some(wad("1750")));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let oracle = MockOracle::new();
        oracle.set_price("B/USD", wad("2"));
        oracle.set_price("A/USD", wad("1"));

        let snapshot = oracle.snapshot();
        assert_eq!(snapshot[0].feed, "A/USD");

        let restored = MockOracle::from_quotes(snapshot);
        assert_eq!(restored.feed_count(), 2);
        assert!(restored.is_supported("B/USD"));
    }
}
