//! Kresko Risk Engine
//!
//! Everything here reads protocol state and never mutates ledgers:
//! - [`interest`]: stability rate and per-krAsset debt index
//! - [`valuation`]: collateral and debt values, account health
//! - [`liquidation`]: maximum liquidatable value and seizure sizing

pub mod error;
pub mod interest;
pub mod liquidation;
pub mod valuation;

pub use error::RiskError;
pub use interest::{DebtIndex, DebtIndexes, SECONDS_PER_YEAR};
pub use liquidation::{max_liquidatable_value, plan_seizure, SeizurePlan};
pub use valuation::{AccountHealth, Valuation};
