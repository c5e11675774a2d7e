//! Setup file read by `kresko init`
//!
//! ```json
//! {
//!   "params": { "minimum_collateralization_ratio": "1.5" },
//!   "admin": "admin",
//!   "kresko_assets": { "krTSLA": { "k_factor": "1", "feed": "TSLA/USD", "supply_limit": "1000000" } },
//!   "collaterals": { "USDC": { "factor": "1", "feed": "USDC/USD", "decimals": 6 } },
//!   "prices": { "USDC/USD": "1", "TSLA/USD": "1000" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use kresko_core::{AccountId, AssetId, Wad};
use kresko_registry::{CollateralAssetConfig, DebtAssetConfig, ProtocolParams, Role, RoleRegistry};
use serde::{Deserialize, Serialize};

use crate::context::ContextError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(default)]
    pub params: ProtocolParams,

    /// Holds both the admin and operator roles
    pub admin: AccountId,

    #[serde(default)]
    pub operators: Vec<AccountId>,

    /// Listed before collaterals so anchored collateral can reference them
    #[serde(default)]
    pub kresko_assets: BTreeMap<AssetId, DebtAssetConfig>,

    #[serde(default)]
    pub collaterals: BTreeMap<AssetId, CollateralAssetConfig>,

    /// Initial USD price per feed
    #[serde(default)]
    pub prices: BTreeMap<String, Wad>,
}

impl SetupConfig {
    pub fn from_file(path: &Path) -> Result<Self, ContextError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn roles(&self) -> RoleRegistry {
        let mut roles = RoleRegistry::new()
            .with_role(Role::Admin, self.admin.clone())
            .with_role(Role::Operator, self.admin.clone());
        for operator in &self.operators {
            roles.grant(Role::Operator, operator.clone());
        }
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let config: SetupConfig = serde_json::from_str(r#"{ "admin": "root" }"#).unwrap();
        assert_eq!(config.params, ProtocolParams::default());
        assert!(config.collaterals.is_empty());
        assert!(config.prices.is_empty());
    }

    #[test]
    fn test_parse_assets_and_prices() {
        let json = r#"{
            "admin": "root",
            "operators": ["ops"],
            "kresko_assets": {
                "krTSLA": { "k_factor": "1.1", "feed": "TSLA/USD", "supply_limit": "500" }
            },
            "collaterals": {
                "USDC": { "factor": "1", "feed": "USDC/USD", "decimals": 6 },
                "akrTSLA": { "factor": "0.9", "feed": "TSLA/USD", "decimals": 18, "anchor": "krTSLA" }
            },
            "prices": { "USDC/USD": "1", "TSLA/USD": "950.5" }
        }"#;
        let config: SetupConfig = serde_json::from_str(json).unwrap();

        let tsla = &config.kresko_assets[&AssetId::from("krTSLA")];
        assert_eq!(tsla.k_factor, "1.1".parse::<Wad>().unwrap());
        assert!(tsla.mintable);

        let anchored = &config.collaterals[&AssetId::from("akrTSLA")];
        assert_eq!(anchored.anchor, Some(AssetId::from("krTSLA")));
        assert_eq!(config.prices["TSLA/USD"], "950.5".parse::<Wad>().unwrap());

        let roles = config.roles();
        assert_eq!(roles.members(Role::Operator).count(), 2);
        assert_eq!(roles.members(Role::Admin).count(), 1);
    }
}
