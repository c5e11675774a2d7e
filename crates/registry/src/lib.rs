//! Kresko Asset Registry
//!
//! ## Key Components
//!
//! - [`config::ProtocolParams`] - Global risk parameters, loadable from JSON
//! - [`asset::CollateralAssetConfig`] / [`asset::DebtAssetConfig`] - Per-asset parameters
//! - [`registry::AssetRegistry`] - Add/update/lookup of listed assets
//! - [`roles::RoleRegistry`] - Role assignments behind the [`roles::AccessControl`] seam

pub mod asset;
pub mod config;
pub mod error;
pub mod registry;
pub mod roles;

pub use asset::{CollateralAssetConfig, DebtAssetConfig, StabilityRateConfig, KRASSET_DECIMALS};
pub use config::{MarketClosedPolicy, ProtocolParams};
pub use error::RegistryError;
pub use registry::AssetRegistry;
pub use roles::{AccessControl, Role, RoleRegistry};
