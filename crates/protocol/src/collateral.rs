//! Collateral deposit and withdrawal
//!
//! External collateral moves through the vault. Anchored collateral (a
//! listed krAsset) moves as internal token units into protocol custody and
//! the ledger records those units, so rebases never change its value.

use kresko_core::{AccountId, AssetId, Rounding};
use kresko_token::RebaseLookup;
use tracing::info;

use crate::error::{ProtocolResult, ValidationError};
use crate::protocol::Protocol;
use crate::state::Staged;
use crate::vault::CollateralVault;

pub(crate) fn require_user(account: &AccountId) -> ProtocolResult<()> {
    if account.is_reserved() {
        return Err(ValidationError::ReservedAccount(account.clone()).into());
    }
    Ok(())
}

pub(crate) fn require_positive(amount: u128) -> ProtocolResult<()> {
    if amount == 0 {
        return Err(ValidationError::ZeroAmount.into());
    }
    Ok(())
}

impl Staged<'_> {
    /// krAsset backing `asset` when it is anchored collateral
    pub(crate) fn anchor_of(&self, asset: &AssetId) -> ProtocolResult<Option<AssetId>> {
        Ok(self.state.registry.collateral(asset)?.anchor.clone())
    }

    /// Debit `stored` ledger units of collateral from `account` and route the
    /// underlying to `recipients` (observed amounts for the vault, internal
    /// units for anchored collateral).
    pub(crate) fn release_collateral(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        stored: u128,
        hint: Option<usize>,
        recipients: &[(AccountId, u128)],
    ) -> ProtocolResult<()> {
        self.state.collateral.withdraw(account, asset, stored, hint)?;
        match self.anchor_of(asset)? {
            Some(krasset) => {
                let token = self.state.tokens.token_mut(&krasset)?;
                for (to, units) in recipients {
                    if *units > 0 {
                        token.transfer_internal(&AccountId::protocol(), to, *units)?;
                    }
                }
            }
            None => {
                for (to, amount) in recipients {
                    self.push(to, asset, *amount);
                }
            }
        }
        Ok(())
    }
}

impl<V: CollateralVault> Protocol<V> {
    /// Deposit `amount` native units of a collateral asset
    pub fn deposit_collateral(&mut self, account: &AccountId, asset: &AssetId, amount: u128) -> ProtocolResult<()> {
        require_user(account)?;
        require_positive(amount)?;
        let balance = self.stage("deposit_collateral", |s| {
            match s.anchor_of(asset)? {
                Some(krasset) => {
                    let units = s.state.tokens.rebase_info(&krasset).to_internal(amount, Rounding::Up)?;
                    s.state
                        .tokens
                        .token_mut(&krasset)?
                        .transfer_internal(account, &AccountId::protocol(), units)?;
                    s.state.collateral.deposit(account, asset, units)?;
                }
                None => {
                    s.state.collateral.deposit(account, asset, amount)?;
                    s.pull(account, asset, amount);
                }
            }
            Ok(s.valuation().collateral_deposits(account, asset)?)
        })?;
        info!(account = %account, asset = %asset, amount, balance, "Collateral deposited");
        Ok(())
    }

    /// Withdraw `amount` native units. `hint` is the asset's position in the
    /// account's deposited list, checked when the deposit is emptied.
    pub fn withdraw_collateral(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
        hint: Option<usize>,
    ) -> ProtocolResult<()> {
        require_user(account)?;
        require_positive(amount)?;
        let balance = self.stage("withdraw_collateral", |s| {
            match s.anchor_of(asset)? {
                Some(krasset) => {
                    let observed = s.valuation().collateral_deposits(account, asset)?;
                    let units = if amount == observed {
                        s.state.collateral.deposits(account, asset)
                    } else {
                        s.state.tokens.rebase_info(&krasset).to_internal(amount, Rounding::Up)?
                    };
                    s.release_collateral(account, asset, units, hint, &[(account.clone(), units)])?;
                }
                None => {
                    s.release_collateral(account, asset, amount, hint, &[(account.clone(), amount)])?;
                }
            }
            let mcr = s.params().minimum_collateralization_ratio;
            s.require_solvent(account, mcr)?;
            Ok(s.valuation().collateral_deposits(account, asset)?)
        })?;
        info!(account = %account, asset = %asset, amount, balance, "Collateral withdrawn");
        Ok(())
    }
}
