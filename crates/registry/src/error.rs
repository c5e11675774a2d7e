//! Registry errors

use kresko_core::AssetId;
use thiserror::Error;

/// Errors from the Asset Registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Collateral asset not found: {0}")]
    CollateralNotFound(AssetId),

    #[error("Kresko asset not found: {0}")]
    KreskoAssetNotFound(AssetId),

    #[error("Collateral asset already exists: {0}")]
    CollateralExists(AssetId),

    #[error("Kresko asset already exists: {0}")]
    KreskoAssetExists(AssetId),

    #[error("Invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    pub(crate) fn invalid(name: &'static str, value: impl ToString, reason: &'static str) -> Self {
        RegistryError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
