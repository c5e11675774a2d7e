//! Kresko Tokens - the rebase layer
//!
//! - [`RebaseInfo`]: pure transform between internal and observed units
//! - [`KreskoAsset`]: rebasing synthetic with ERC-20 style allowances
//! - [`KreskoAssetAnchor`]: non-rebasing share wrapper
//! - [`TokenBook`]: every listed krAsset and its anchor

pub mod anchor;
pub mod book;
pub mod error;
pub mod krasset;
pub mod rebase;

pub use anchor::KreskoAssetAnchor;
pub use book::TokenBook;
pub use error::TokenError;
pub use krasset::{KreskoAsset, UNLIMITED_ALLOWANCE};
pub use rebase::{RebaseInfo, RebaseLookup};
