//! Ledger errors

use kresko_core::{AccountId, AssetId};
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Insufficient {asset} balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        available: u128,
        requested: u128,
    },

    #[error("Stale index for {asset}: supplied {supplied}, current {current:?}")]
    StaleIndex {
        asset: AssetId,
        supplied: usize,
        current: Option<usize>,
    },

    #[error("Balance overflow for {asset}")]
    Overflow { asset: AssetId },
}
