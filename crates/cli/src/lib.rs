//! Kresko CLI - protocol simulator
//!
//! This crate provides the `kresko` binary and the command layer it drives.
//! Protocol state, collateral wallets, roles, oracle quotes and the clock
//! persist as one JSON snapshot under the data directory.

pub mod commands;
pub mod config;
pub mod context;

pub use config::SetupConfig;
pub use context::{AppContext, ContextError};
