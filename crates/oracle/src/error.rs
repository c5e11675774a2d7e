//! Oracle error types

use thiserror::Error;

/// Oracle-related errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Feed not configured
    #[error("Price feed not found: {feed}")]
    FeedNotFound { feed: String },

    /// Price data is stale (older than threshold)
    #[error("Stale price for {feed}: last update at {last_update}, threshold is {threshold_secs}s")]
    StalePrice {
        feed: String,
        last_update: i64,
        threshold_secs: u64,
    },

    /// Price data is invalid
    #[error("Invalid price for {feed}: {reason}")]
    InvalidPrice { feed: String, reason: String },
}
