//! Token errors

use kresko_core::{AccountId, AssetId, MathError, Wad};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Insufficient {asset} balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountId,
        asset: AssetId,
        available: u128,
        requested: u128,
    },

    #[error("Insufficient allowance from {owner} to {spender}: allowance {allowance}, requested {requested}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        allowance: u128,
        requested: u128,
    },

    #[error("Rebase denominator must be at least 1, got {0}")]
    InvalidDenominator(Wad),

    #[error("Unknown token: {0}")]
    UnknownToken(AssetId),

    #[error("Token already exists: {0}")]
    TokenExists(AssetId),

    #[error(transparent)]
    Math(#[from] MathError),
}
