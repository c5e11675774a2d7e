//! Liquidation sizing
//!
//! Each unit of value repaid moves the account toward the liquidation
//! threshold by `kFactor * LT * (1 - closeFee) * factor / LIM - 1`. The
//! maximum repayable value is the shortfall divided by that gain.

use kresko_core::amount::from_wad;
use kresko_core::{AccountId, AssetId, Rounding, Wad};
use kresko_registry::KRASSET_DECIMALS;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RiskError;
use crate::valuation::Valuation;

/// Exponent of the collateral factor applied to multi-asset portfolios
const FACTOR_DAMPENING_EXPONENT: u32 = 4;

/// Amounts moved by one liquidation, all in native units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizurePlan {
    /// Value of the repaid krAsset, without kFactor
    pub repay_value: Wad,
    pub seize_price: Wad,
    /// Collateral moved to the liquidator
    pub seized: u128,
    /// Collateral moved to the fee recipient
    pub fee: u128,
}

/// Value gained toward the threshold per unit of value repaid, `None` when
/// it is not positive
pub fn gain_per_unit_repaid(
    valuation: &Valuation<'_>,
    repay_asset: &AssetId,
    seize_asset: &AssetId,
) -> Result<Option<Wad>, RiskError> {
    let params = valuation.registry.params();
    let krasset = valuation.registry.kresko_asset(repay_asset)?;
    let collateral = valuation.registry.collateral(seize_asset)?;

    let gross = krasset
        .k_factor
        .mul(params.liquidation_threshold, Rounding::Down)?
        .mul(Wad::ONE.checked_sub(krasset.close_fee)?, Rounding::Down)?
        .mul(collateral.factor, Rounding::Down)?
        .div(params.liquidation_incentive_multiplier, Rounding::Down)?;
    if gross <= Wad::ONE {
        return Ok(None);
    }
    Ok(Some(gross.checked_sub(Wad::ONE)?))
}

/// Most value of `repay_asset` that may be repaid against `account` while
/// seizing `seize_asset`. Zero for accounts that are not liquidatable.
pub fn max_liquidatable_value(
    valuation: &Valuation<'_>,
    account: &AccountId,
    repay_asset: &AssetId,
    seize_asset: &AssetId,
) -> Result<Wad, RiskError> {
    let threshold = valuation.registry.params().liquidation_threshold;
    let required = valuation.min_collateral_value_at_ratio(account, threshold)?;
    let actual = valuation.account_collateral_value(account)?;
    if actual >= required {
        return Ok(Wad::ZERO);
    }
    let value_under = required.checked_sub(actual)?;

    let Some(gain) = gain_per_unit_repaid(valuation, repay_asset, seize_asset)? else {
        // no repayment improves the ratio; allow a full unwind instead
        let debt = valuation.kresko_asset_debt(account, repay_asset)?;
        let full = valuation.kr_asset_value(repay_asset, debt, true)?;
        debug!(account = %account, asset = %repay_asset, max = %full, "Non-positive liquidation gain");
        return Ok(full);
    };

    let mut max = value_under.div(gain, Rounding::Down)?;
    let factor = valuation.registry.collateral(seize_asset)?.factor;
    if factor < Wad::ONE && valuation.collateral.deposited_assets(account).len() > 1 {
        max = max.mul(factor.pow(FACTOR_DAMPENING_EXPONENT)?, Rounding::Down)?;
    }
    debug!(
        account = %account,
        repay_asset = %repay_asset,
        seize_asset = %seize_asset,
        value_under = %value_under,
        max = %max,
        "Max liquidatable value"
    );
    Ok(max)
}

/// `max_liquidatable_value` expressed in repay asset tokens, rounded down
pub fn max_repay_amount(
    valuation: &Valuation<'_>,
    account: &AccountId,
    repay_asset: &AssetId,
    seize_asset: &AssetId,
) -> Result<u128, RiskError> {
    let max = max_liquidatable_value(valuation, account, repay_asset, seize_asset)?;
    let feed = &valuation.registry.kresko_asset(repay_asset)?.feed;
    let price = valuation.oracle.price(feed)?;
    let tokens = max.div(price, Rounding::Down)?;
    Ok(from_wad(tokens, KRASSET_DECIMALS, Rounding::Down)?)
}

/// Collateral seized for repaying `repay_amount` of `repay_asset`.
///
/// `seized = repay_value * LIM / seize_price`. The close fee is charged on
/// top in the seized asset and capped at what the deposit has left.
pub fn plan_seizure(
    valuation: &Valuation<'_>,
    account: &AccountId,
    repay_asset: &AssetId,
    repay_amount: u128,
    seize_asset: &AssetId,
) -> Result<SeizurePlan, RiskError> {
    let params = valuation.registry.params();
    let krasset = valuation.registry.kresko_asset(repay_asset)?;
    let collateral = valuation.registry.collateral(seize_asset)?;

    let repay_value = valuation.kr_asset_value(repay_asset, repay_amount, true)?;
    let seize_price = valuation.oracle.price(&collateral.feed)?;

    let seize_value = repay_value.mul(params.liquidation_incentive_multiplier, Rounding::Down)?;
    let seized = from_wad(
        seize_value.div(seize_price, Rounding::Down)?,
        collateral.decimals,
        Rounding::Down,
    )?;

    let fee_value = repay_value.mul(krasset.close_fee, Rounding::Down)?;
    let fee = from_wad(
        fee_value.div(seize_price, Rounding::Down)?,
        collateral.decimals,
        Rounding::Down,
    )?;
    let remaining = valuation
        .collateral_deposits(account, seize_asset)?
        .saturating_sub(seized);

    Ok(SeizurePlan {
        repay_value,
        seize_price,
        seized,
        fee: fee.min(remaining),
    })
}
