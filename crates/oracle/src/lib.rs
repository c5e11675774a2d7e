//! Kresko Price Oracle
//!
//! Per-feed `(price, market open)` lookups consumed by the valuation engine.
//! Implements `MockOracle` for tests and the CLI simulator; real feeds plug in
//! through the `PriceOracle` trait.

mod error;
mod mock;
mod types;

pub use error::OracleError;
pub use mock::MockOracle;
pub use types::{PriceOracle, PriceQuote};
