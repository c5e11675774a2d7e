//! Position book - per-account, per-asset raw amounts plus an indexed list
//! of the assets each account holds a non-zero amount of.

use kresko_core::{AccountId, AssetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LedgerError;
use crate::list::IndexedAssetList;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AccountPositions {
    amounts: BTreeMap<AssetId, u128>,
    assets: IndexedAssetList,
}

impl AccountPositions {
    pub fn amount(&self, asset: &AssetId) -> u128 {
        self.amounts.get(asset).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Entries exist exactly while their amount is non-zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct PositionBook {
    accounts: BTreeMap<AccountId, AccountPositions>,
}

impl PositionBook {
    pub fn amount(&self, account: &AccountId, asset: &AssetId) -> u128 {
        self.accounts
            .get(account)
            .map(|p| p.amount(asset))
            .unwrap_or(0)
    }

    pub fn assets(&self, account: &AccountId) -> &[AssetId] {
        self.accounts
            .get(account)
            .map(|p| p.assets.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_of(&self, account: &AccountId, asset: &AssetId) -> Option<usize> {
        self.accounts.get(account).and_then(|p| p.assets.index_of(asset))
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.accounts.keys()
    }

    /// Add to a position, listing the asset if it is new. Returns the new amount.
    pub fn increase(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<u128, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let positions = self.accounts.entry(account.clone()).or_default();
        let current = positions.amount(asset);
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow {
                asset: asset.clone(),
            })?;
        positions.amounts.insert(asset.clone(), updated);
        positions.assets.insert(asset.clone());
        Ok(updated)
    }

    /// Subtract from a position. A supplied `hint` must point at the asset
    /// even when the position stays open. When it reaches zero the asset is
    /// swap-removed from the account's list. Nothing is mutated on error. Returns the remaining amount.
    pub fn decrease(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
        hint: Option<usize>,
    ) -> Result<u128, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let available = self.amount(account, asset);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientBalance {
                account: account.clone(),
                asset: asset.clone(),
                available,
                requested: amount,
            })?;

        // available > 0 here, so the account entry exists
        let Some(positions) = self.accounts.get_mut(account) else {
            return Ok(remaining);
        };
        if hint.is_some() {
            positions.assets.check_hint(asset, hint)?;
        }
        if remaining == 0 {
            positions.assets.remove(asset, hint)?;
            positions.amounts.remove(asset);
            if positions.is_empty() {
                self.accounts.remove(account);
            }
        } else {
            positions.amounts.insert(asset.clone(), remaining);
        }
        Ok(remaining)
    }
}
