//! Protocol state and the staging area operations run against

use kresko_core::{amount::to_wad, AccountId, AssetId, MathError, Ray, Rounding, Wad};
use kresko_ledger::{CollateralLedger, DebtLedger};
use kresko_oracle::PriceOracle;
use kresko_registry::{AssetRegistry, ProtocolParams, KRASSET_DECIMALS};
use kresko_risk::interest::{price_rate, principal_from_debt, stability_rate};
use kresko_risk::{DebtIndexes, Valuation};
use kresko_token::{RebaseLookup, TokenBook};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProtocolError, ProtocolResult, ValidationError};
use crate::vault::VaultTransfer;

/// Everything an operation may change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolState {
    pub registry: AssetRegistry,
    pub collateral: CollateralLedger,
    pub debt: DebtLedger,
    pub indexes: DebtIndexes,
    pub tokens: TokenBook,
}

impl ProtocolState {
    pub fn new(params: ProtocolParams) -> ProtocolResult<Self> {
        Ok(Self {
            registry: AssetRegistry::new(params)?,
            ..Default::default()
        })
    }

    pub fn valuation<'a>(&'a self, oracle: &'a dyn PriceOracle, now: u64) -> Valuation<'a> {
        Valuation {
            registry: &self.registry,
            collateral: &self.collateral,
            debt: &self.debt,
            indexes: &self.indexes,
            rebases: &self.tokens,
            oracle,
            now,
        }
    }
}

/// A private copy of the state plus the vault transfers it implies.
/// Replaces the live state only when the operation succeeds.
pub(crate) struct Staged<'a> {
    pub state: ProtocolState,
    pub oracle: &'a dyn PriceOracle,
    pub now: u64,
    pub transfers: Vec<VaultTransfer>,
}

impl<'a> Staged<'a> {
    pub fn valuation(&self) -> Valuation<'_> {
        self.state.valuation(self.oracle, self.now)
    }

    pub fn params(&self) -> &ProtocolParams {
        self.state.registry.params()
    }

    /// Bring the debt index of `asset` to now and record the current rate
    pub fn accrue(&mut self, asset: &AssetId) -> ProtocolResult<Ray> {
        let config = self.state.registry.kresko_asset(asset)?;
        let rate = stability_rate(&config.stability, price_rate(self.oracle, &config.feed)?)?;
        Ok(self.state.indexes.update(asset, self.now, rate)?)
    }

    pub fn require_market_open(&self, asset: &AssetId) -> ProtocolResult<()> {
        let feed = &self.state.registry.kresko_asset(asset)?.feed;
        if !self.oracle.is_market_open(feed)? {
            return Err(ProtocolError::MarketClosed(asset.clone()));
        }
        Ok(())
    }

    /// Collateral value must cover `ratio × debt value`
    pub fn require_solvent(&self, account: &AccountId, ratio: Wad) -> ProtocolResult<()> {
        let (solvent, required, actual) = self.valuation().is_solvent_at(account, ratio)?;
        if !solvent {
            return Err(ProtocolError::InsufficientCollateral { required, actual });
        }
        Ok(())
    }

    /// Remaining debt in `asset` is zero or worth at least the minimum
    pub fn require_minimum_debt(&self, account: &AccountId, asset: &AssetId) -> ProtocolResult<()> {
        let valuation = self.valuation();
        let debt = valuation.kresko_asset_debt(account, asset)?;
        if debt == 0 {
            return Ok(());
        }
        let value = valuation.kr_asset_value(asset, debt, true)?;
        let minimum = self.params().minimum_debt_value;
        if value < minimum {
            return Err(ValidationError::DebtBelowMinimum {
                asset: asset.clone(),
                value,
                minimum,
            }
            .into());
        }
        Ok(())
    }

    /// Observed total supply after adding `amount` must stay within the cap
    pub fn require_supply_room(&self, asset: &AssetId, amount: u128) -> ProtocolResult<()> {
        let limit = self.state.registry.kresko_asset(asset)?.supply_limit;
        let supply = self.state.tokens.token(asset)?.total_supply()?;
        let after = supply
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        let requested = to_wad(after, KRASSET_DECIMALS)?;
        if requested > limit {
            return Err(ProtocolError::SupplyLimitExceeded {
                asset: asset.clone(),
                limit,
                requested,
            });
        }
        Ok(())
    }

    /// Reduce debt by `amount` observed tokens. Repaying the whole debt
    /// clears the principal exactly; partial repayments remove principal
    /// rounded down. Returns the principal removed.
    pub fn repay_debt(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
        hint: Option<usize>,
    ) -> ProtocolResult<u128> {
        let debt = self.valuation().kresko_asset_debt(account, asset)?;
        if debt == 0 {
            return Err(ValidationError::NoDebt {
                account: account.clone(),
                asset: asset.clone(),
            }
            .into());
        }
        if amount > debt {
            return Err(ValidationError::ExceedsDebt {
                asset: asset.clone(),
                debt,
                requested: amount,
            }
            .into());
        }

        let principal = if amount == debt {
            self.state.debt.principal(account, asset)
        } else {
            let index = self.state.indexes.current(asset, self.now)?;
            let internal = self
                .state
                .tokens
                .rebase_info(asset)
                .to_internal(amount, Rounding::Down)?;
            principal_from_debt(internal, index, Rounding::Down)?
        };
        if principal == 0 {
            return Err(ValidationError::ZeroAmount.into());
        }
        self.state
            .debt
            .remove_principal(account, asset, principal, hint)?;
        debug!(account = %account, asset = %asset, amount, principal, "Debt repaid");
        Ok(principal)
    }

    pub fn pull(&mut self, from: &AccountId, asset: &AssetId, amount: u128) {
        self.transfers.push(VaultTransfer::Pull {
            from: from.clone(),
            asset: asset.clone(),
            amount,
        });
    }

    pub fn push(&mut self, to: &AccountId, asset: &AssetId, amount: u128) {
        if amount > 0 {
            self.transfers.push(VaultTransfer::Push {
                to: to.clone(),
                asset: asset.clone(),
                amount,
            });
        }
    }
}
