//! Asset Registry - admin-mutated mapping from asset id to risk parameters

use kresko_core::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::asset::{CollateralAssetConfig, DebtAssetConfig, StabilityRateConfig};
use crate::config::ProtocolParams;
use crate::error::RegistryError;

/// Registered collateral assets, krAssets and the global parameters.
///
/// Entries are only ever added or updated; nothing is removed while
/// positions may reference it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistry {
    params: ProtocolParams,
    collaterals: BTreeMap<AssetId, CollateralAssetConfig>,
    kresko_assets: BTreeMap<AssetId, DebtAssetConfig>,
}

impl AssetRegistry {
    pub fn new(params: ProtocolParams) -> Result<Self, RegistryError> {
        params.validate()?;
        Ok(Self {
            params,
            ..Default::default()
        })
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Replace the global parameters after validating them
    pub fn set_params(&mut self, params: ProtocolParams) -> Result<(), RegistryError> {
        params.validate()?;
        info!(
            mcr = %params.minimum_collateralization_ratio,
            lt = %params.liquidation_threshold,
            lim = %params.liquidation_incentive_multiplier,
            "Protocol parameters updated"
        );
        self.params = params;
        Ok(())
    }

    // === Collateral ===

    pub fn add_collateral(
        &mut self,
        asset: AssetId,
        config: CollateralAssetConfig,
    ) -> Result<(), RegistryError> {
        if self.collaterals.contains_key(&asset) {
            return Err(RegistryError::CollateralExists(asset));
        }
        self.check_collateral(&config)?;
        info!(asset = %asset, factor = %config.factor, "Collateral asset added");
        self.collaterals.insert(asset, config);
        Ok(())
    }

    pub fn update_collateral(
        &mut self,
        asset: &AssetId,
        config: CollateralAssetConfig,
    ) -> Result<(), RegistryError> {
        let current = self.collateral(asset)?;
        if current.decimals != config.decimals || current.anchor != config.anchor {
            return Err(RegistryError::invalid(
                "decimals",
                config.decimals,
                "token identity cannot change after listing",
            ));
        }
        self.check_collateral(&config)?;
        info!(asset = %asset, factor = %config.factor, "Collateral asset updated");
        self.collaterals.insert(asset.clone(), config);
        Ok(())
    }

    pub fn collateral(&self, asset: &AssetId) -> Result<&CollateralAssetConfig, RegistryError> {
        self.collaterals
            .get(asset)
            .ok_or_else(|| RegistryError::CollateralNotFound(asset.clone()))
    }

    pub fn is_collateral(&self, asset: &AssetId) -> bool {
        self.collaterals.contains_key(asset)
    }

    pub fn collaterals(&self) -> impl Iterator<Item = (&AssetId, &CollateralAssetConfig)> {
        self.collaterals.iter()
    }

    fn check_collateral(&self, config: &CollateralAssetConfig) -> Result<(), RegistryError> {
        config.validate()?;
        if let Some(krasset) = &config.anchor {
            self.kresko_asset(krasset)?;
        }
        Ok(())
    }

    // === Kresko assets ===

    pub fn add_kresko_asset(
        &mut self,
        asset: AssetId,
        config: DebtAssetConfig,
    ) -> Result<(), RegistryError> {
        if self.kresko_assets.contains_key(&asset) {
            return Err(RegistryError::KreskoAssetExists(asset));
        }
        config.validate()?;
        info!(asset = %asset, k_factor = %config.k_factor, "Kresko asset added");
        self.kresko_assets.insert(asset, config);
        Ok(())
    }

    pub fn update_kresko_asset(
        &mut self,
        asset: &AssetId,
        config: DebtAssetConfig,
    ) -> Result<(), RegistryError> {
        self.kresko_asset(asset)?;
        config.validate()?;
        info!(
            asset = %asset,
            k_factor = %config.k_factor,
            mintable = config.mintable,
            "Kresko asset updated"
        );
        self.kresko_assets.insert(asset.clone(), config);
        Ok(())
    }

    pub fn set_stability_rate(
        &mut self,
        asset: &AssetId,
        stability: StabilityRateConfig,
    ) -> Result<(), RegistryError> {
        stability.validate()?;
        let config = self
            .kresko_assets
            .get_mut(asset)
            .ok_or_else(|| RegistryError::KreskoAssetNotFound(asset.clone()))?;
        info!(asset = %asset, base_rate = %stability.base_rate, "Stability rate updated");
        config.stability = stability;
        Ok(())
    }

    pub fn kresko_asset(&self, asset: &AssetId) -> Result<&DebtAssetConfig, RegistryError> {
        self.kresko_assets
            .get(asset)
            .ok_or_else(|| RegistryError::KreskoAssetNotFound(asset.clone()))
    }

    pub fn is_kresko_asset(&self, asset: &AssetId) -> bool {
        self.kresko_assets.contains_key(asset)
    }

    pub fn kresko_assets(&self) -> impl Iterator<Item = (&AssetId, &DebtAssetConfig)> {
        self.kresko_assets.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kresko_core::Wad;

    fn wad(s: &str) -> Wad {
        s.parse().unwrap()
    }

    fn registry() -> AssetRegistry {
        let mut registry = AssetRegistry::new(ProtocolParams::default()).unwrap();
        registry
            .add_collateral("USDC".into(), CollateralAssetConfig::new(Wad::ONE, "USDC/USD", 6))
            .unwrap();
        registry
            .add_kresko_asset(
                "krTSLA".into(),
                DebtAssetConfig::new(Wad::ONE, "TSLA/USD", wad("1000000")),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        assert!(registry.is_collateral(&"USDC".into()));
        assert!(!registry.is_collateral(&"krTSLA".into()));
        assert_eq!(registry.collateral(&"USDC".into()).unwrap().decimals, 6);
        assert!(matches!(
            registry.kresko_asset(&"krETH".into()),
            Err(RegistryError::KreskoAssetNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = registry();
        let result =
            registry.add_collateral("USDC".into(), CollateralAssetConfig::new(Wad::ONE, "USDC/USD", 6));
        assert!(matches!(result, Err(RegistryError::CollateralExists(_))));
    }

    #[test]
    fn test_anchored_collateral_requires_krasset() {
        let mut registry = registry();
        let config = CollateralAssetConfig::new(wad("0.8"), "ETH/USD", 18).with_anchor("krETH".into());
        assert!(registry.add_collateral("krETH".into(), config).is_err());

        let config = CollateralAssetConfig::new(wad("0.8"), "TSLA/USD", 18).with_anchor("krTSLA".into());
        assert!(registry.add_collateral("krTSLA".into(), config).is_ok());
    }

    #[test]
    fn test_update_collateral_keeps_decimals() {
        let mut registry = registry();
        let usdc = AssetId::from("USDC");

        let lowered = CollateralAssetConfig::new(wad("0.9"), "USDC/USD", 6);
        registry.update_collateral(&usdc, lowered).unwrap();
        assert_eq!(registry.collateral(&usdc).unwrap().factor, wad("0.9"));

        let redenominated = CollateralAssetConfig::new(wad("0.9"), "USDC/USD", 18);
        assert!(registry.update_collateral(&usdc, redenominated).is_err());
    }

    #[test]
    fn test_update_kresko_asset() {
        let mut registry = registry();
        let tsla = AssetId::from("krTSLA");
        let config = registry.kresko_asset(&tsla).unwrap().clone().with_mintable(false);
        registry.update_kresko_asset(&tsla, config).unwrap();
        assert!(!registry.kresko_asset(&tsla).unwrap().mintable);
    }

    #[test]
    fn test_set_stability_rate() {
        let mut registry = registry();
        let tsla = AssetId::from("krTSLA");
        let flat = StabilityRateConfig::flat("0.05".parse().unwrap());
        registry.set_stability_rate(&tsla, flat.clone()).unwrap();
        assert_eq!(registry.kresko_asset(&tsla).unwrap().stability, flat);
        assert!(registry.set_stability_rate(&"krETH".into(), flat).is_err());
    }

    #[test]
    fn test_set_params_validates() {
        let mut registry = registry();
        let params = ProtocolParams {
            minimum_collateralization_ratio: wad("1.2"),
            ..Default::default()
        };
        assert!(registry.set_params(params).is_err());
        assert_eq!(registry.params().minimum_collateralization_ratio, wad("1.5"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let registry = registry();
        let json = serde_json::to_string(&registry).unwrap();
        let parsed: AssetRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, registry);
    }
}
