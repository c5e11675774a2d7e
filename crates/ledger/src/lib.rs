//! Kresko Ledgers - collateral deposits and krAsset debt positions
//!
//! # Key Types
//! - `CollateralLedger`: raw deposited amounts per (account, asset)
//! - `DebtLedger`: index-scaled principal per (account, krAsset)
//! - `IndexedAssetList`: per-account asset list with swap-remove and hint checks

mod book;
pub mod collateral;
pub mod debt;
pub mod error;
pub mod list;

pub use collateral::CollateralLedger;
pub use debt::DebtLedger;
pub use error::LedgerError;
pub use list::IndexedAssetList;
