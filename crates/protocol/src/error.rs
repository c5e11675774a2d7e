//! Protocol errors
//!
//! Every error aborts the whole operation; nothing is committed.

use kresko_core::{AccountId, AssetId, MathError, Wad};
use kresko_ledger::LedgerError;
use kresko_oracle::OracleError;
use kresko_registry::{RegistryError, Role};
use kresko_risk::RiskError;
use kresko_token::TokenError;
use thiserror::Error;

/// Input rejected before any state is touched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Unknown collateral asset: {0}")]
    UnknownCollateral(AssetId),

    #[error("Unknown kresko asset: {0}")]
    UnknownKreskoAsset(AssetId),

    #[error("Kresko asset is not mintable: {0}")]
    NotMintable(AssetId),

    #[error("Account is reserved: {0}")]
    ReservedAccount(AccountId),

    #[error("Account cannot liquidate itself")]
    SelfLiquidation,

    #[error("{account} has no {asset} debt")]
    NoDebt { account: AccountId, asset: AssetId },

    #[error("{account} has no {asset} deposit")]
    NotDeposited { account: AccountId, asset: AssetId },

    #[error("Amount {requested} exceeds {asset} debt {debt}")]
    ExceedsDebt {
        asset: AssetId,
        debt: u128,
        requested: u128,
    },

    #[error("{asset} debt value {value} below minimum {minimum}")]
    DebtBelowMinimum {
        asset: AssetId,
        value: Wad,
        minimum: Wad,
    },

    #[error("Repay value {value} exceeds max liquidatable value {max}")]
    RepayExceedsMax { value: Wad, max: Wad },

    #[error("Seized {seized} {asset} exceeds deposit {deposited}")]
    SeizeExceedsDeposit {
        asset: AssetId,
        seized: u128,
        deposited: u128,
    },

    #[error("Repayment too small to seize any collateral")]
    NothingToSeize,
}

/// Errors from external collateral custody
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Insufficient {asset} in wallet of {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        asset: AssetId,
        available: u128,
        requested: u128,
    },

    #[error("Vault custody short of {asset}: held {held}, requested {requested}")]
    CustodyShortfall {
        asset: AssetId,
        held: u128,
        requested: u128,
    },

    #[error("Vault overflow for {0}")]
    Overflow(AssetId),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Insufficient collateral: required {required}, actual {actual}")]
    InsufficientCollateral { required: Wad, actual: Wad },

    #[error("Insufficient allowance from {owner} to {spender}: allowance {allowance}, requested {requested}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        allowance: u128,
        requested: u128,
    },

    #[error("Account is not liquidatable: {0}")]
    NotLiquidatable(AccountId),

    #[error("Supply limit exceeded for {asset}: limit {limit}, requested {requested}")]
    SupplyLimitExceeded {
        asset: AssetId,
        limit: Wad,
        requested: Wad,
    },

    #[error("Stale index for {asset}: supplied {supplied}, current {current:?}")]
    StaleIndex {
        asset: AssetId,
        supplied: usize,
        current: Option<usize>,
    },

    #[error("{account} lacks role {role}")]
    Unauthorized { account: AccountId, role: Role },

    #[error("Market closed for {0}")]
    MarketClosed(AssetId),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Registry error: {0}")]
    Registry(RegistryError),

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    #[error("Token error: {0}")]
    Token(TokenError),
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl ProtocolError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ProtocolError::Validation(_))
    }
}

impl From<RegistryError> for ProtocolError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::CollateralNotFound(asset) => ValidationError::UnknownCollateral(asset).into(),
            RegistryError::KreskoAssetNotFound(asset) => ValidationError::UnknownKreskoAsset(asset).into(),
            other => ProtocolError::Registry(other),
        }
    }
}

impl From<LedgerError> for ProtocolError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ZeroAmount => ValidationError::ZeroAmount.into(),
            LedgerError::StaleIndex {
                asset,
                supplied,
                current,
            } => ProtocolError::StaleIndex {
                asset,
                supplied,
                current,
            },
            other => ProtocolError::Ledger(other),
        }
    }
}

impl From<TokenError> for ProtocolError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::ZeroAmount => ValidationError::ZeroAmount.into(),
            TokenError::UnknownToken(asset) => ValidationError::UnknownKreskoAsset(asset).into(),
            TokenError::InsufficientAllowance {
                owner,
                spender,
                allowance,
                requested,
            } => ProtocolError::InsufficientAllowance {
                owner,
                spender,
                allowance,
                requested,
            },
            TokenError::Math(err) => ProtocolError::Math(err),
            other => ProtocolError::Token(other),
        }
    }
}

impl From<RiskError> for ProtocolError {
    fn from(err: RiskError) -> Self {
        match err {
            RiskError::Math(err) => err.into(),
            RiskError::Oracle(err) => err.into(),
            RiskError::Registry(err) => err.into(),
            RiskError::Token(err) => err.into(),
        }
    }
}
