//! Valuation engine - USD values of collateral and debt
//!
//! Read-only. Prices are read from the oracle on every call and debt is
//! valued at the debt index projected to `now`, so a `Valuation` can be
//! built over staged state before and after a tentative change.

use kresko_core::amount::to_wad;
use kresko_core::{AccountId, AssetId, Rounding, Wad};
use kresko_ledger::{CollateralLedger, DebtLedger};
use kresko_oracle::PriceOracle;
use kresko_registry::{AssetRegistry, MarketClosedPolicy, KRASSET_DECIMALS};
use kresko_token::RebaseLookup;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RiskError;
use crate::interest::{debt_from_principal, DebtIndexes};

/// Liquidation state of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountHealth {
    /// Collateral value at or above the liquidation threshold requirement
    Healthy,
    /// Below the liquidation threshold requirement
    Liquidatable,
    /// No outstanding debt
    FullyUnwound,
}

pub struct Valuation<'a> {
    pub registry: &'a AssetRegistry,
    pub collateral: &'a CollateralLedger,
    pub debt: &'a DebtLedger,
    pub indexes: &'a DebtIndexes,
    pub rebases: &'a dyn RebaseLookup,
    pub oracle: &'a dyn PriceOracle,
    /// Unix seconds used to project debt indexes
    pub now: u64,
}

impl<'a> Valuation<'a> {
    // === Collateral ===

    /// Deposit of `asset` in native (observed) units. Anchored krAsset
    /// collateral is stored as shares and converted through the rebase.
    pub fn collateral_deposits(&self, account: &AccountId, asset: &AssetId) -> Result<u128, RiskError> {
        let stored = self.collateral.deposits(account, asset);
        let config = self.registry.collateral(asset)?;
        match &config.anchor {
            Some(krasset) => Ok(self
                .rebases
                .rebase_info(krasset)
                .to_observed(stored, Rounding::Down)?),
            None => Ok(stored),
        }
    }

    /// Value of `amount` native units of collateral `asset` and its price.
    /// The collateral factor is applied unless `ignore_factor`.
    pub fn collateral_value_and_price(
        &self,
        asset: &AssetId,
        amount: u128,
        ignore_factor: bool,
    ) -> Result<(Wad, Wad), RiskError> {
        let config = self.registry.collateral(asset)?;
        let price = self.oracle.price(&config.feed)?;
        let mut value = to_wad(amount, config.decimals)?.mul(price, Rounding::Down)?;
        if !ignore_factor {
            value = value.mul(config.factor, Rounding::Down)?;
        }
        Ok((value, price))
    }

    /// Σ `amount × price × factor` over the account's deposits, rounded down
    pub fn account_collateral_value(&self, account: &AccountId) -> Result<Wad, RiskError> {
        let policy = self.registry.params().market_closed_policy;
        let mut total = Wad::ZERO;
        for asset in self.collateral.deposited_assets(account) {
            if policy == MarketClosedPolicy::Exclude {
                let feed = &self.registry.collateral(asset)?.feed;
                if !self.oracle.is_market_open(feed)? {
                    debug!(account = %account, asset = %asset, "Closed market excluded from collateral");
                    continue;
                }
            }
            let amount = self.collateral_deposits(account, asset)?;
            let (value, _) = self.collateral_value_and_price(asset, amount, false)?;
            total = total.checked_add(value)?;
        }
        Ok(total)
    }

    // === Debt ===

    /// Owed amount of `asset` in observed token units, interest included
    pub fn kresko_asset_debt(&self, account: &AccountId, asset: &AssetId) -> Result<u128, RiskError> {
        let principal = self.debt.principal(account, asset);
        if principal == 0 {
            return Ok(0);
        }
        let index = self.indexes.current(asset, self.now)?;
        let internal = debt_from_principal(principal, index)?;
        Ok(self
            .rebases
            .rebase_info(asset)
            .to_observed(internal, Rounding::Up)?)
    }

    /// Value of `amount` krAsset tokens, with the kFactor unless
    /// `ignore_k_factor`. Rounded up.
    pub fn kr_asset_value(&self, asset: &AssetId, amount: u128, ignore_k_factor: bool) -> Result<Wad, RiskError> {
        let config = self.registry.kresko_asset(asset)?;
        let price = self.oracle.price(&config.feed)?;
        let mut value = to_wad(amount, KRASSET_DECIMALS)?.mul(price, Rounding::Up)?;
        if !ignore_k_factor {
            value = value.mul(config.k_factor, Rounding::Up)?;
        }
        Ok(value)
    }

    /// Σ `debt × price × kFactor` over the account's minted assets, rounded up
    pub fn account_debt_value(&self, account: &AccountId) -> Result<Wad, RiskError> {
        let mut total = Wad::ZERO;
        for asset in self.debt.minted_assets(account) {
            let amount = self.kresko_asset_debt(account, asset)?;
            total = total.checked_add(self.kr_asset_value(asset, amount, false)?)?;
        }
        Ok(total)
    }

    /// `account_debt_value × ratio`, rounded up
    pub fn min_collateral_value_at_ratio(&self, account: &AccountId, ratio: Wad) -> Result<Wad, RiskError> {
        Ok(self.account_debt_value(account)?.mul(ratio, Rounding::Up)?)
    }

    /// Collateral value over debt value; `None` without debt
    pub fn collateral_ratio(&self, account: &AccountId) -> Result<Option<Wad>, RiskError> {
        let debt = self.account_debt_value(account)?;
        if debt.is_zero() {
            return Ok(None);
        }
        let collateral = self.account_collateral_value(account)?;
        Ok(Some(collateral.div(debt, Rounding::Down)?))
    }

    // === Health ===

    pub fn is_liquidatable(&self, account: &AccountId) -> Result<bool, RiskError> {
        let threshold = self.registry.params().liquidation_threshold;
        let required = self.min_collateral_value_at_ratio(account, threshold)?;
        Ok(self.account_collateral_value(account)? < required)
    }

    pub fn health(&self, account: &AccountId) -> Result<AccountHealth, RiskError> {
        if self.debt.minted_assets(account).is_empty() {
            return Ok(AccountHealth::FullyUnwound);
        }
        if self.is_liquidatable(account)? {
            Ok(AccountHealth::Liquidatable)
        } else {
            Ok(AccountHealth::Healthy)
        }
    }

    /// Collateral covers `ratio × debt`
    pub fn is_solvent_at(&self, account: &AccountId, ratio: Wad) -> Result<(bool, Wad, Wad), RiskError> {
        let required = self.min_collateral_value_at_ratio(account, ratio)?;
        let actual = self.account_collateral_value(account)?;
        Ok((actual >= required, required, actual))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use kresko_core::amount::units;
    use kresko_oracle::MockOracle;
    use kresko_registry::{CollateralAssetConfig, DebtAssetConfig, ProtocolParams};
    use kresko_token::{RebaseInfo, TokenBook};

    pub(crate) fn wad(s: &str) -> Wad {
        s.parse().unwrap()
    }

    /// Registry, ledgers and oracle for valuation tests
    pub(crate) struct Fixture {
        pub registry: AssetRegistry,
        pub collateral: CollateralLedger,
        pub debt: DebtLedger,
        pub indexes: DebtIndexes,
        pub tokens: TokenBook,
        pub oracle: MockOracle,
    }

    impl Fixture {
        pub fn new() -> Self {
            let mut registry = AssetRegistry::new(ProtocolParams::default()).unwrap();
            registry
                .add_collateral("USDC".into(), CollateralAssetConfig::new(Wad::ONE, "USDC/USD", 6))
                .unwrap();
            registry
                .add_collateral("WETH".into(), CollateralAssetConfig::new(wad("0.9"), "ETH/USD", 18))
                .unwrap();
            registry
                .add_kresko_asset(
                    "krTSLA".into(),
                    DebtAssetConfig::new(Wad::ONE, "TSLA/USD", wad("1000000")),
                )
                .unwrap();

            let oracle = MockOracle::new();
            oracle.set_price("USDC/USD", Wad::ONE);
            oracle.set_price("ETH/USD", wad("2000"));
            oracle.set_price("TSLA/USD", wad("1000"));

            let mut tokens = TokenBook::new();
            tokens.create(&"krTSLA".into()).unwrap();

            Self {
                registry,
                collateral: CollateralLedger::new(),
                debt: DebtLedger::new(),
                indexes: DebtIndexes::new(),
                tokens,
                oracle,
            }
        }

        pub fn valuation(&self) -> Valuation<'_> {
            Valuation {
                registry: &self.registry,
                collateral: &self.collateral,
                debt: &self.debt,
                indexes: &self.indexes,
                rebases: &self.tokens,
                oracle: &self.oracle,
                now: 0,
            }
        }
    }

    #[test]
    fn test_scenario_collateral_and_debt_values() {
        let mut fx = Fixture::new();
        let alice = AccountId::from("alice");
        fx.collateral
            .deposit(&alice, &"USDC".into(), units(10_000_000, 6).unwrap())
            .unwrap();
        fx.debt
            .add_principal(&alice, &"krTSLA".into(), units(1_000, 18).unwrap())
            .unwrap();

        let v = fx.valuation();
        assert_eq!(v.account_collateral_value(&alice).unwrap(), wad("10000000"));
        assert_eq!(v.account_debt_value(&alice).unwrap(), wad("1000000"));
        assert_eq!(
            v.min_collateral_value_at_ratio(&alice, wad("1.5")).unwrap(),
            wad("1500000")
        );
        assert_eq!(v.collateral_ratio(&alice).unwrap(), Some(wad("10")));
        assert_eq!(v.health(&alice).unwrap(), AccountHealth::Healthy);
    }

    #[test]
    fn test_factor_discounts_collateral() {
        let mut fx = Fixture::new();
        let alice = AccountId::from("alice");
        fx.collateral
            .deposit(&alice, &"WETH".into(), units(1, 18).unwrap())
            .unwrap();

        let v = fx.valuation();
        let (value, price) = v
            .collateral_value_and_price(&"WETH".into(), units(1, 18).unwrap(), false)
            .unwrap();
        assert_eq!((value, price), (wad("1800"), wad("2000")));
        let (raw, _) = v
            .collateral_value_and_price(&"WETH".into(), units(1, 18).unwrap(), true)
            .unwrap();
        assert_eq!(raw, wad("2000"));
        assert_eq!(v.account_collateral_value(&alice).unwrap(), wad("1800"));
    }

    #[test]
    fn test_k_factor_inflates_debt() {
        let mut fx = Fixture::new();
        let tsla = AssetId::from("krTSLA");
        let config = fx.registry.kresko_asset(&tsla).unwrap().clone();
        let config = DebtAssetConfig {
            k_factor: wad("1.25"),
            ..config
        };
        fx.registry.update_kresko_asset(&tsla, config).unwrap();

        let v = fx.valuation();
        let two = units(2, 18).unwrap();
        assert_eq!(v.kr_asset_value(&tsla, two, false).unwrap(), wad("2500"));
        assert_eq!(v.kr_asset_value(&tsla, two, true).unwrap(), wad("2000"));
    }

    #[test]
    fn test_debt_grows_with_index() {
        let mut fx = Fixture::new();
        let alice = AccountId::from("alice");
        let tsla = AssetId::from("krTSLA");
        fx.debt.add_principal(&alice, &tsla, 1_000).unwrap();
        fx.indexes.init(&tsla, "0.1".parse().unwrap(), 0);

        let mut v = fx.valuation();
        assert_eq!(v.kresko_asset_debt(&alice, &tsla).unwrap(), 1_000);
        v.now = crate::interest::SECONDS_PER_YEAR;
        assert_eq!(v.kresko_asset_debt(&alice, &tsla).unwrap(), 1_100);
    }

    #[test]
    fn test_debt_follows_rebase() {
        let mut fx = Fixture::new();
        let alice = AccountId::from("alice");
        let tsla = AssetId::from("krTSLA");
        fx.debt.add_principal(&alice, &tsla, units(1, 18).unwrap()).unwrap();
        let split = RebaseInfo::new(wad("2"), true).unwrap();
        fx.tokens.token_mut(&tsla).unwrap().rebase(split).unwrap();
        fx.oracle.set_price("TSLA/USD", wad("500"));

        let v = fx.valuation();
        assert_eq!(v.kresko_asset_debt(&alice, &tsla).unwrap(), units(2, 18).unwrap());
        // a 2:1 split at half the price keeps the value
        assert_eq!(v.account_debt_value(&alice).unwrap(), wad("1000"));
    }

    #[test]
    fn test_closed_market_policy() {
        let mut fx = Fixture::new();
        let alice = AccountId::from("alice");
        fx.collateral
            .deposit(&alice, &"WETH".into(), units(1, 18).unwrap())
            .unwrap();
        fx.oracle.set_market_open("ETH/USD", false).unwrap();

        assert_eq!(fx.valuation().account_collateral_value(&alice).unwrap(), wad("1800"));

        let params = ProtocolParams {
            market_closed_policy: MarketClosedPolicy::Exclude,
            ..Default::default()
        };
        fx.registry.set_params(params).unwrap();
        assert_eq!(fx.valuation().account_collateral_value(&alice).unwrap(), Wad::ZERO);
    }

    #[test]
    fn test_health_transitions() {
        let mut fx = Fixture::new();
        let alice = AccountId::from("alice");
        assert_eq!(fx.valuation().health(&alice).unwrap(), AccountHealth::FullyUnwound);

        fx.collateral
            .deposit(&alice, &"USDC".into(), units(1_500, 6).unwrap())
            .unwrap();
        fx.debt
            .add_principal(&alice, &"krTSLA".into(), units(1, 18).unwrap())
            .unwrap();
        assert_eq!(fx.valuation().health(&alice).unwrap(), AccountHealth::Healthy);
        assert_eq!(fx.valuation().collateral_ratio(&alice).unwrap(), Some(wad("1.5")));

        // ratio drops to 1.25, below the 1.4 threshold
        fx.oracle.set_price("TSLA/USD", wad("1200"));
        assert_eq!(fx.valuation().health(&alice).unwrap(), AccountHealth::Liquidatable);
        assert!(fx.valuation().is_liquidatable(&alice).unwrap());
    }
}
