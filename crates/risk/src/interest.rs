//! Stability rate and debt index
//!
//! Each krAsset carries a ray-precision debt index. Owed amount is
//! `principal * index`. The index accrues linearly between touches:
//! `index * (1 + rate_per_second * elapsed)`, using the rate recorded at the
//! previous touch, and is never decreased.

use kresko_core::{AssetId, Ray, Rounding};
use kresko_oracle::PriceOracle;
use kresko_registry::StabilityRateConfig;
use serde::{Deserialize, Serialize};
use std::cmp::min;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::RiskError;

/// 365 days
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Annual stability rate for a krAsset trading at `price_rate`
/// (`market price / oracle price`).
///
/// Without a market price the base rate applies. At or above the optimal
/// price rate the base rate applies. Below it the rate climbs by up to
/// `rate_slope1` across the first `price_rate_delta` of deviation, then by up
/// to `rate_slope2` as the price rate falls further towards zero.
pub fn stability_rate(config: &StabilityRateConfig, price_rate: Option<Ray>) -> Result<Ray, RiskError> {
    let Some(price_rate) = price_rate else {
        return Ok(config.base_rate);
    };
    let optimal = config.optimal_price_rate;
    if price_rate >= optimal {
        return Ok(config.base_rate);
    }

    let deviation = optimal.checked_sub(price_rate)?;
    let delta = config.price_rate_delta;
    let mut rate = config.base_rate;

    if !delta.is_zero() {
        let within = min(deviation, delta);
        let share = within.div(delta, Rounding::Up)?;
        rate = rate.checked_add(config.rate_slope1.mul(share, Rounding::Up)?)?;
    }
    if deviation > delta {
        let beyond = deviation.checked_sub(delta)?;
        let span = optimal.checked_sub(delta)?;
        let share = beyond.div(span, Rounding::Up)?;
        rate = rate.checked_add(config.rate_slope2.mul(share, Rounding::Up)?)?;
    }
    Ok(rate)
}

/// `market price / oracle price` for a feed, if the oracle tracks a market
pub fn price_rate(oracle: &dyn PriceOracle, feed: &str) -> Result<Option<Ray>, RiskError> {
    let Some(market) = oracle.market_price(feed) else {
        return Ok(None);
    };
    let reference = oracle.price(feed)?;
    Ok(Some(market.div(reference, Rounding::Down)?.to_ray()?))
}

/// Debt index of one krAsset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtIndex {
    pub index: Ray,
    /// Annual rate applied since `last_update`
    pub rate: Ray,
    /// Unix seconds
    pub last_update: u64,
}

impl DebtIndex {
    pub fn new(rate: Ray, now: u64) -> Self {
        Self {
            index: Ray::ONE,
            rate,
            last_update: now,
        }
    }

    /// Index as of `now` without mutating. A clock behind `last_update`
    /// counts as no elapsed time.
    pub fn projected(&self, now: u64) -> Result<Ray, RiskError> {
        let elapsed = now.saturating_sub(self.last_update);
        if elapsed == 0 || self.rate.is_zero() {
            return Ok(self.index);
        }
        let growth = Ray::ONE.checked_add(self.rate.mul_int(elapsed)?.div_int(SECONDS_PER_YEAR)?)?;
        Ok(self.index.mul(growth, Rounding::Up)?)
    }

    /// Bring the index to `now` and switch to `rate` for the next period
    pub fn accrue(&mut self, now: u64, rate: Ray) -> Result<Ray, RiskError> {
        self.index = self.projected(now)?;
        self.last_update = self.last_update.max(now);
        self.rate = rate;
        Ok(self.index)
    }
}

/// Debt indexes of every krAsset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebtIndexes {
    indexes: BTreeMap<AssetId, DebtIndex>,
}

impl DebtIndexes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an asset at index 1
    pub fn init(&mut self, asset: &AssetId, rate: Ray, now: u64) {
        self.indexes
            .entry(asset.clone())
            .or_insert_with(|| DebtIndex::new(rate, now));
    }

    pub fn get(&self, asset: &AssetId) -> Option<&DebtIndex> {
        self.indexes.get(asset)
    }

    /// Index of `asset` projected to `now`; 1 for untracked assets
    pub fn current(&self, asset: &AssetId, now: u64) -> Result<Ray, RiskError> {
        match self.indexes.get(asset) {
            Some(index) => index.projected(now),
            None => Ok(Ray::ONE),
        }
    }

    /// Accrue `asset` to `now` and record the rate for the next period
    pub fn update(&mut self, asset: &AssetId, now: u64, rate: Ray) -> Result<Ray, RiskError> {
        let entry = self
            .indexes
            .entry(asset.clone())
            .or_insert_with(|| DebtIndex::new(rate, now));
        let before = entry.index;
        let index = entry.accrue(now, rate)?;
        debug!(asset = %asset, before = %before, index = %index, rate = %rate, "Debt index accrued");
        Ok(index)
    }
}

/// Owed amount for a principal at `index`, rounded up
pub fn debt_from_principal(principal: u128, index: Ray) -> Result<u128, RiskError> {
    Ok(index.mul_amount(principal, Rounding::Up)?)
}

/// Principal for an owed amount at `index`
pub fn principal_from_debt(amount: u128, index: Ray, rounding: Rounding) -> Result<u128, RiskError> {
    Ok(index.div_amount(amount, rounding)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kresko_core::Wad;
    use kresko_oracle::MockOracle;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ray(s: &str) -> Ray {
        s.parse().unwrap()
    }

    #[test]
    fn test_linear_accrual_over_a_year() {
        let index = DebtIndex::new(ray("0.1"), 1_000);
        assert_eq!(index.projected(1_000 + SECONDS_PER_YEAR).unwrap(), ray("1.1"));
        assert_eq!(index.projected(1_000).unwrap(), Ray::ONE);
    }

    #[test]
    fn test_clock_going_backwards_is_no_op() {
        let mut index = DebtIndex::new(ray("0.1"), 1_000);
        assert_eq!(index.accrue(500, ray("0.1")).unwrap(), Ray::ONE);
        assert_eq!(index.last_update, 1_000);
    }

    #[test]
    fn test_accrue_uses_previous_rate() {
        let mut index = DebtIndex::new(ray("0.2"), 0);
        index.accrue(SECONDS_PER_YEAR / 2, Ray::ZERO).unwrap();
        assert_eq!(index.index, ray("1.1"));
        // zero rate from here on
        assert_eq!(index.projected(SECONDS_PER_YEAR * 10).unwrap(), ray("1.1"));
    }

    #[test]
    fn test_index_is_monotonic() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut indexes = DebtIndexes::new();
        let asset = AssetId::from("krETH");
        indexes.init(&asset, ray("0.05"), 0);

        let mut now = 0u64;
        let mut last = Ray::ONE;
        for _ in 0..500 {
            now += rng.gen_range(0..86_400 * 30);
            let rate = Ray::from_raw(rng.gen_range(0u128..2_000_000_000_000_000_000_000_000_000).into());
            let index = indexes.update(&asset, now, rate).unwrap();
            assert!(index >= last);
            assert!(indexes.current(&asset, now + 1).unwrap() >= index);
            last = index;
        }
    }

    #[test]
    fn test_untracked_asset_index_is_one() {
        let indexes = DebtIndexes::new();
        assert_eq!(indexes.current(&"krTSLA".into(), 123).unwrap(), Ray::ONE);
    }

    #[test]
    fn test_principal_conversions_round_against_account() {
        let index = ray("1.5");
        assert_eq!(debt_from_principal(3, index).unwrap(), 5);
        assert_eq!(principal_from_debt(4, index, Rounding::Up).unwrap(), 3);
        assert_eq!(principal_from_debt(4, index, Rounding::Down).unwrap(), 2);
    }

    #[test]
    fn test_stability_rate_kink() {
        let config = StabilityRateConfig::default();
        // no market price, at par and at a premium: base rate
        assert_eq!(stability_rate(&config, None).unwrap(), ray("0.01"));
        assert_eq!(stability_rate(&config, Some(Ray::ONE)).unwrap(), ray("0.01"));
        assert_eq!(stability_rate(&config, Some(ray("1.2"))).unwrap(), ray("0.01"));

        // half the delta below optimal: base + slope1 / 2
        assert_eq!(stability_rate(&config, Some(ray("0.9875"))).unwrap(), ray("0.06"));
        // exactly at the kink: base + slope1
        assert_eq!(stability_rate(&config, Some(ray("0.975"))).unwrap(), ray("0.11"));
        // at zero: base + slope1 + slope2
        assert_eq!(stability_rate(&config, Some(Ray::ZERO)).unwrap(), ray("5.11"));
    }

    #[test]
    fn test_flat_rate_ignores_price() {
        let config = StabilityRateConfig::flat(ray("0.03"));
        assert_eq!(stability_rate(&config, Some(ray("0.5"))).unwrap(), ray("0.03"));
    }

    #[test]
    fn test_price_rate_from_oracle() {
        let oracle = MockOracle::new();
        oracle.set_price("ETH/USD", Wad::from_int(2_000).unwrap());
        assert_eq!(price_rate(&oracle, "ETH/USD").unwrap(), None);

        oracle.set_market_price("ETH/USD", Wad::from_int(1_900).unwrap());
        assert_eq!(price_rate(&oracle, "ETH/USD").unwrap(), Some(ray("0.95")));
    }
}
