//! Kresko Protocol - synthetic asset accounting and risk engine
//!
//! [`Protocol`] is the single entry point. Every mutating call runs against
//! a staged copy of [`ProtocolState`] and commits all-or-nothing:
//!
//! - collateral: `deposit_collateral`, `withdraw_collateral`
//! - debt: `mint_kresko_asset`, `burn_kresko_asset`
//! - liquidation: `liquidate`
//! - tokens: `transfer`, `approve`, `transfer_from`, `wrap`, `unwrap`
//! - administration: asset listing, stability rates, parameters, `rebase`

mod collateral;
mod liquidation;
mod minter;
mod tokens;
mod views;

pub mod clock;
pub mod error;
pub mod protocol;
pub mod state;
pub mod vault;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ProtocolError, ProtocolResult, ValidationError, VaultError};
pub use liquidation::{LiquidationOutcome, LiquidationRequest};
pub use protocol::Protocol;
pub use state::ProtocolState;
pub use vault::{CollateralVault, InMemoryVault, VaultTransfer};

pub use kresko_risk::AccountHealth;
