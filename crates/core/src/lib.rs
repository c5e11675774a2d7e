//! Kresko Core - Domain types
//!
//! This crate contains the fundamental types used across the protocol:
//! - `Wad` / `Ray`: 18- and 27-decimal fixed-point values with explicit rounding
//! - `amount`: conversion between asset-native raw amounts and `Wad`
//! - `AssetId` / `AccountId`: identifiers

pub mod amount;
pub mod asset;
pub mod error;
pub mod fixed_point;

pub use asset::{AccountId, AssetId, IdError};
pub use error::MathError;
pub use fixed_point::{Ray, Rounding, Wad};
