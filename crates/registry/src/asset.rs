//! Asset configuration - collateral assets and Kresko assets (krAssets)

use kresko_core::amount::MAX_DECIMALS;
use kresko_core::{AssetId, Ray, Wad};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// krAssets are always 18-decimal tokens
pub const KRASSET_DECIMALS: u8 = 18;

/// Largest open or close fee (10%)
pub fn max_fee() -> Wad {
    Wad::from_raw_u128(100_000_000_000_000_000)
}

/// A deposit-able collateral asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralAssetConfig {
    /// Discount applied to the price, in [0, 1]
    pub factor: Wad,

    /// Oracle feed quoting this asset
    pub feed: String,

    /// Set when the collateral is itself a rebasing krAsset. Deposits are
    /// then held as non-rebasing anchor shares of that krAsset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AssetId>,

    /// Native token decimals
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_decimals() -> u8 {
    18
}

impl CollateralAssetConfig {
    pub fn new(factor: Wad, feed: impl Into<String>, decimals: u8) -> Self {
        Self {
            factor,
            feed: feed.into(),
            anchor: None,
            decimals,
        }
    }

    pub fn with_anchor(mut self, krasset: AssetId) -> Self {
        self.anchor = Some(krasset);
        self.decimals = KRASSET_DECIMALS;
        self
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.factor > Wad::ONE {
            return Err(RegistryError::invalid("factor", self.factor, "must not exceed 1"));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(RegistryError::invalid("decimals", self.decimals, "unsupported precision"));
        }
        if self.anchor.is_some() && self.decimals != KRASSET_DECIMALS {
            return Err(RegistryError::invalid(
                "decimals",
                self.decimals,
                "anchored collateral uses 18 decimals",
            ));
        }
        validate_feed(&self.feed)
    }
}

/// A mintable synthetic asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtAssetConfig {
    /// Weight inflating the debt value, at least 1
    pub k_factor: Wad,

    /// Oracle feed quoting this asset
    pub feed: String,

    /// Whether new debt can be opened
    #[serde(default = "default_mintable")]
    pub mintable: bool,

    /// Fee charged on burn, in [0, 0.1]
    #[serde(default)]
    pub close_fee: Wad,

    /// Fee charged on mint, in [0, 0.1]
    #[serde(default)]
    pub open_fee: Wad,

    /// Cap on the observed total supply, in whole tokens
    pub supply_limit: Wad,

    #[serde(default)]
    pub stability: StabilityRateConfig,
}

fn default_mintable() -> bool {
    true
}

impl DebtAssetConfig {
    pub fn new(k_factor: Wad, feed: impl Into<String>, supply_limit: Wad) -> Self {
        Self {
            k_factor,
            feed: feed.into(),
            mintable: true,
            close_fee: Wad::ZERO,
            open_fee: Wad::ZERO,
            supply_limit,
            stability: StabilityRateConfig::default(),
        }
    }

    pub fn with_fees(mut self, close_fee: Wad, open_fee: Wad) -> Self {
        self.close_fee = close_fee;
        self.open_fee = open_fee;
        self
    }

    pub fn with_mintable(mut self, mintable: bool) -> Self {
        self.mintable = mintable;
        self
    }

    pub fn with_stability(mut self, stability: StabilityRateConfig) -> Self {
        self.stability = stability;
        self
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.k_factor < Wad::ONE {
            return Err(RegistryError::invalid("k_factor", self.k_factor, "must be at least 1"));
        }
        if self.close_fee > max_fee() {
            return Err(RegistryError::invalid("close_fee", self.close_fee, "must not exceed 0.1"));
        }
        if self.open_fee > max_fee() {
            return Err(RegistryError::invalid("open_fee", self.open_fee, "must not exceed 0.1"));
        }
        validate_feed(&self.feed)?;
        self.stability.validate()
    }
}

/// Stability rate parameters, annual rates in ray precision
///
/// The rate depends on the price rate, `market price / oracle price`. Inside
/// `optimal_price_rate - price_rate_delta` the base rate grows with
/// `rate_slope1`; further below it grows with `rate_slope2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityRateConfig {
    #[serde(default = "default_base_rate")]
    pub base_rate: Ray,

    #[serde(default = "default_rate_slope1")]
    pub rate_slope1: Ray,

    #[serde(default = "default_rate_slope2")]
    pub rate_slope2: Ray,

    #[serde(default = "default_optimal_price_rate")]
    pub optimal_price_rate: Ray,

    #[serde(default = "default_price_rate_delta")]
    pub price_rate_delta: Ray,
}

// 10^25, 1%
fn default_base_rate() -> Ray {
    Ray::from_raw(10_000_000_000_000_000_000_000_000u128.into())
}

// 10%
fn default_rate_slope1() -> Ray {
    Ray::from_raw(100_000_000_000_000_000_000_000_000u128.into())
}

// 500%
fn default_rate_slope2() -> Ray {
    Ray::from_raw(5_000_000_000_000_000_000_000_000_000u128.into())
}

fn default_optimal_price_rate() -> Ray {
    Ray::ONE
}

// 2.5%
fn default_price_rate_delta() -> Ray {
    Ray::from_raw(25_000_000_000_000_000_000_000_000u128.into())
}

impl Default for StabilityRateConfig {
    fn default() -> Self {
        Self {
            base_rate: default_base_rate(),
            rate_slope1: default_rate_slope1(),
            rate_slope2: default_rate_slope2(),
            optimal_price_rate: default_optimal_price_rate(),
            price_rate_delta: default_price_rate_delta(),
        }
    }
}

impl StabilityRateConfig {
    /// Flat rate with no price sensitivity
    pub fn flat(base_rate: Ray) -> Self {
        Self {
            base_rate,
            rate_slope1: Ray::ZERO,
            rate_slope2: Ray::ZERO,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.optimal_price_rate.is_zero() {
            return Err(RegistryError::invalid(
                "optimal_price_rate",
                self.optimal_price_rate,
                "must be positive",
            ));
        }
        if self.price_rate_delta >= self.optimal_price_rate {
            return Err(RegistryError::invalid(
                "price_rate_delta",
                self.price_rate_delta,
                "must be below the optimal price rate",
            ));
        }
        Ok(())
    }
}

fn validate_feed(feed: &str) -> Result<(), RegistryError> {
    if feed.trim().is_empty() {
        return Err(RegistryError::invalid("feed", feed, "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wad(s: &str) -> Wad {
        s.parse().unwrap()
    }

    #[test]
    fn test_collateral_factor_bound() {
        assert!(CollateralAssetConfig::new(wad("1"), "USDC/USD", 6).validate().is_ok());
        assert!(CollateralAssetConfig::new(wad("0"), "USDC/USD", 6).validate().is_ok());
        assert!(CollateralAssetConfig::new(wad("1.01"), "USDC/USD", 6)
            .validate()
            .is_err());
    }

    #[test]
    fn test_anchored_collateral_forces_krasset_decimals() {
        let config = CollateralAssetConfig::new(wad("0.9"), "TSLA/USD", 6).with_anchor("krTSLA".into());
        assert_eq!(config.decimals, KRASSET_DECIMALS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_krasset_bounds() {
        let base = DebtAssetConfig::new(wad("1.1"), "TSLA/USD", wad("1000000"));
        assert!(base.validate().is_ok());

        let low_k = DebtAssetConfig::new(wad("0.9"), "TSLA/USD", wad("1"));
        assert!(low_k.validate().is_err());

        let high_fee = base.clone().with_fees(wad("0.11"), Wad::ZERO);
        assert!(matches!(
            high_fee.validate(),
            Err(RegistryError::InvalidParameter { name: "close_fee", .. })
        ));
    }

    #[test]
    fn test_stability_defaults() {
        let stability = StabilityRateConfig::default();
        assert_eq!(stability.base_rate, "0.01".parse::<Ray>().unwrap());
        assert_eq!(stability.rate_slope2, "5".parse::<Ray>().unwrap());
        assert_eq!(stability.price_rate_delta, "0.025".parse::<Ray>().unwrap());
        assert!(stability.validate().is_ok());
    }

    #[test]
    fn test_stability_delta_must_be_below_optimal() {
        let stability = StabilityRateConfig {
            price_rate_delta: Ray::ONE,
            ..Default::default()
        };
        assert!(stability.validate().is_err());
    }

    #[test]
    fn test_krasset_json_defaults() {
        let json = r#"{ "k_factor": "1.05", "feed": "ETH/USD", "supply_limit": "100000" }"#;
        let config: DebtAssetConfig = serde_json::from_str(json).unwrap();
        assert!(config.mintable);
        assert_eq!(config.close_fee, Wad::ZERO);
        assert_eq!(config.stability, StabilityRateConfig::default());
    }
}
