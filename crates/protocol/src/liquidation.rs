//! Liquidation execution
//!
//! The liquidator burns its own krAsset tokens against the account's debt
//! and receives collateral worth `repay value × LIM`. The close fee is
//! taken from the same collateral for the fee recipient.

use kresko_core::{AccountId, AssetId, Rounding, Wad};
use kresko_risk::liquidation::{max_liquidatable_value, plan_seizure};
use kresko_risk::AccountHealth;
use kresko_token::RebaseLookup;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collateral::{require_positive, require_user};
use crate::error::{ProtocolError, ProtocolResult, ValidationError};
use crate::protocol::Protocol;
use crate::vault::CollateralVault;

/// What a liquidation moved, in native units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    pub account: AccountId,
    pub liquidator: AccountId,
    pub repay_asset: AssetId,
    pub repaid: u128,
    pub repay_value: Wad,
    pub seize_asset: AssetId,
    pub seized: u128,
    pub fee: u128,
}

/// Arguments of one liquidation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationRequest {
    pub account: AccountId,
    pub repay_asset: AssetId,
    pub repay_amount: u128,
    pub seize_asset: AssetId,
    /// Position of `repay_asset` in the account's minted list
    pub minted_index: Option<usize>,
    /// Position of `seize_asset` in the account's deposited list
    pub deposited_index: Option<usize>,
}

impl LiquidationRequest {
    pub fn new(account: AccountId, repay_asset: AssetId, repay_amount: u128, seize_asset: AssetId) -> Self {
        Self {
            account,
            repay_asset,
            repay_amount,
            seize_asset,
            minted_index: None,
            deposited_index: None,
        }
    }

    pub fn with_indexes(mut self, minted_index: usize, deposited_index: usize) -> Self {
        self.minted_index = Some(minted_index);
        self.deposited_index = Some(deposited_index);
        self
    }
}

impl<V: CollateralVault> Protocol<V> {
    pub fn liquidate(
        &mut self,
        liquidator: &AccountId,
        request: LiquidationRequest,
    ) -> ProtocolResult<LiquidationOutcome> {
        let LiquidationRequest {
            account,
            repay_asset,
            repay_amount,
            seize_asset,
            minted_index,
            deposited_index,
        } = request;
        require_user(liquidator)?;
        require_positive(repay_amount)?;
        if *liquidator == account {
            return Err(ValidationError::SelfLiquidation.into());
        }

        let outcome = self.stage("liquidate", |s| {
            s.state.registry.kresko_asset(&repay_asset)?;
            s.state.registry.collateral(&seize_asset)?;
            s.require_market_open(&repay_asset)?;
            s.accrue(&repay_asset)?;

            if s.valuation().health(&account)? != AccountHealth::Liquidatable {
                return Err(ProtocolError::NotLiquidatable(account.clone()));
            }
            let deposited = s.valuation().collateral_deposits(&account, &seize_asset)?;
            if deposited == 0 {
                return Err(ValidationError::NotDeposited {
                    account: account.clone(),
                    asset: seize_asset.clone(),
                }
                .into());
            }

            let valuation = s.valuation();
            let max = max_liquidatable_value(&valuation, &account, &repay_asset, &seize_asset)?;
            let plan = plan_seizure(&valuation, &account, &repay_asset, repay_amount, &seize_asset)?;
            if plan.repay_value > max {
                return Err(ValidationError::RepayExceedsMax {
                    value: plan.repay_value,
                    max,
                }
                .into());
            }
            if plan.seized == 0 {
                return Err(ValidationError::NothingToSeize.into());
            }
            if plan.seized > deposited {
                return Err(ValidationError::SeizeExceedsDeposit {
                    asset: seize_asset.clone(),
                    seized: plan.seized,
                    deposited,
                }
                .into());
            }

            s.repay_debt(&account, &repay_asset, repay_amount, minted_index)?;
            s.state.tokens.token_mut(&repay_asset)?.burn(liquidator, repay_amount)?;

            let fee_recipient = s.params().fee_recipient.clone();
            match s.anchor_of(&seize_asset)? {
                Some(krasset) => {
                    let rebase = s.state.tokens.rebase_info(&krasset);
                    let stored = s.state.collateral.deposits(&account, &seize_asset);
                    let seized_units = rebase.to_internal(plan.seized, Rounding::Down)?;
                    if seized_units == 0 {
                        return Err(ValidationError::NothingToSeize.into());
                    }
                    let fee_units = rebase
                        .to_internal(plan.fee, Rounding::Down)?
                        .min(stored.saturating_sub(seized_units));
                    s.release_collateral(
                        &account,
                        &seize_asset,
                        seized_units + fee_units,
                        deposited_index,
                        &[(liquidator.clone(), seized_units), (fee_recipient, fee_units)],
                    )?;
                }
                None => {
                    s.release_collateral(
                        &account,
                        &seize_asset,
                        plan.seized + plan.fee,
                        deposited_index,
                        &[(liquidator.clone(), plan.seized), (fee_recipient, plan.fee)],
                    )?;
                }
            }

            Ok(LiquidationOutcome {
                account: account.clone(),
                liquidator: liquidator.clone(),
                repay_asset: repay_asset.clone(),
                repaid: repay_amount,
                repay_value: plan.repay_value,
                seize_asset: seize_asset.clone(),
                seized: plan.seized,
                fee: plan.fee,
            })
        })?;

        info!(
            account = %outcome.account,
            liquidator = %outcome.liquidator,
            repay_asset = %outcome.repay_asset,
            repaid = outcome.repaid,
            seize_asset = %outcome.seize_asset,
            seized = outcome.seized,
            fee = outcome.fee,
            "Liquidated"
        );
        Ok(outcome)
    }
}
