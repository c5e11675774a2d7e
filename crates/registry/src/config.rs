//! Protocol parameters
//!
//! Global risk parameters are loaded from a JSON file (every field has a
//! default) and validated on every change.

use kresko_core::{AccountId, Wad};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RegistryError;

/// Upper bound for the liquidation incentive multiplier (125%)
pub fn max_liquidation_incentive() -> Wad {
    Wad::from_raw_u128(1_250_000_000_000_000_000)
}

/// Upper bound for the minimum debt value (USD)
pub fn max_minimum_debt_value() -> Wad {
    Wad::from_raw_u128(1_000_000_000_000_000_000_000)
}

/// Global protocol parameters
///
/// All ratios are 18-decimal fixed point (`"1.5"` is 150%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Collateral value required per unit of weighted debt value
    #[serde(default = "default_minimum_collateralization_ratio")]
    pub minimum_collateralization_ratio: Wad,

    /// Ratio below which an account becomes liquidatable
    #[serde(default = "default_liquidation_threshold")]
    pub liquidation_threshold: Wad,

    /// Collateral seized per unit of value repaid
    #[serde(default = "default_liquidation_incentive_multiplier")]
    pub liquidation_incentive_multiplier: Wad,

    /// Smallest non-zero debt position, in USD
    #[serde(default = "default_minimum_debt_value")]
    pub minimum_debt_value: Wad,

    /// Receives open and close fees
    #[serde(default = "default_fee_recipient")]
    pub fee_recipient: AccountId,

    /// How collateral with a closed market is valued
    #[serde(default)]
    pub market_closed_policy: MarketClosedPolicy,
}

/// Valuation policy for collateral whose market is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarketClosedPolicy {
    /// Value at the last reported price
    #[default]
    IncludeAtLastPrice,

    /// Contribute nothing to the account's collateral value
    Exclude,
}

// Default value functions for serde
fn default_minimum_collateralization_ratio() -> Wad {
    Wad::from_raw_u128(1_500_000_000_000_000_000)
}

fn default_liquidation_threshold() -> Wad {
    Wad::from_raw_u128(1_400_000_000_000_000_000)
}

fn default_liquidation_incentive_multiplier() -> Wad {
    Wad::from_raw_u128(1_050_000_000_000_000_000)
}

fn default_minimum_debt_value() -> Wad {
    Wad::from_raw_u128(10_000_000_000_000_000_000)
}

fn default_fee_recipient() -> AccountId {
    AccountId::from("treasury")
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            minimum_collateralization_ratio: default_minimum_collateralization_ratio(),
            liquidation_threshold: default_liquidation_threshold(),
            liquidation_incentive_multiplier: default_liquidation_incentive_multiplier(),
            minimum_debt_value: default_minimum_debt_value(),
            fee_recipient: default_fee_recipient(),
            market_closed_policy: MarketClosedPolicy::default(),
        }
    }
}

impl ProtocolParams {
    /// Load parameters from a JSON file and validate them
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        let params: Self =
            serde_json::from_str(&content).map_err(|e| RegistryError::ConfigError(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Check the parameter bounds: `1 <= LT <= MCR`, `1 <= LIM <= 1.25`
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mcr = self.minimum_collateralization_ratio;
        let lt = self.liquidation_threshold;
        let lim = self.liquidation_incentive_multiplier;

        if mcr < Wad::ONE {
            return Err(RegistryError::invalid(
                "minimum_collateralization_ratio",
                mcr,
                "must be at least 1",
            ));
        }
        if lt < Wad::ONE || lt > mcr {
            return Err(RegistryError::invalid(
                "liquidation_threshold",
                lt,
                "must be between 1 and the minimum collateralization ratio",
            ));
        }
        if lim < Wad::ONE || lim > max_liquidation_incentive() {
            return Err(RegistryError::invalid(
                "liquidation_incentive_multiplier",
                lim,
                "must be between 1 and 1.25",
            ));
        }
        if self.minimum_debt_value > max_minimum_debt_value() {
            return Err(RegistryError::invalid(
                "minimum_debt_value",
                self.minimum_debt_value,
                "must not exceed 1000",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn wad(s: &str) -> Wad {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_params() {
        let params = ProtocolParams::default();

        assert_eq!(params.minimum_collateralization_ratio, wad("1.5"));
        assert_eq!(params.liquidation_threshold, wad("1.4"));
        assert_eq!(params.liquidation_incentive_multiplier, wad("1.05"));
        assert_eq!(params.minimum_debt_value, wad("10"));
        assert_eq!(params.market_closed_policy, MarketClosedPolicy::IncludeAtLastPrice);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_bound_constants() {
        assert_eq!(max_liquidation_incentive(), wad("1.25"));
        assert_eq!(max_minimum_debt_value(), wad("1000"));
    }

    #[test]
    fn test_params_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{ "minimum_collateralization_ratio": "2", "market_closed_policy": "exclude" }"#;
        let params: ProtocolParams = serde_json::from_str(json).unwrap();

        assert_eq!(params.minimum_collateralization_ratio, wad("2"));
        assert_eq!(params.liquidation_threshold, wad("1.4")); // default
        assert_eq!(params.market_closed_policy, MarketClosedPolicy::Exclude);
    }

    #[test]
    fn test_threshold_above_mcr_rejected() {
        let params = ProtocolParams {
            liquidation_threshold: wad("1.6"),
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(RegistryError::InvalidParameter {
                name: "liquidation_threshold",
                ..
            })
        ));
    }

    #[test]
    fn test_incentive_bounds() {
        let too_high = ProtocolParams {
            liquidation_incentive_multiplier: wad("1.3"),
            ..Default::default()
        };
        assert!(too_high.validate().is_err());

        let below_one = ProtocolParams {
            liquidation_incentive_multiplier: wad("0.99"),
            ..Default::default()
        };
        assert!(below_one.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "fee_recipient": "feevault", "minimum_debt_value": "20" }}"#).unwrap();

        let params = ProtocolParams::from_file(file.path()).unwrap();
        assert_eq!(params.fee_recipient, AccountId::from("feevault"));
        assert_eq!(params.minimum_debt_value, wad("20"));
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "liquidation_threshold": "0.9" }}"#).unwrap();
        assert!(ProtocolParams::from_file(file.path()).is_err());
    }
}
