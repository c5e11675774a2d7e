//! Kresko asset anchor - non-rebasing wrapper over a rebasing krAsset
//!
//! One share is one internal unit of the underlying, so a share's claim on
//! observed tokens moves with every rebase while share balances never do.
//! Wrapped underlying sits in the anchor's custody account.

use kresko_core::{AccountId, AssetId, Rounding};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::TokenError;
use crate::krasset::KreskoAsset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KreskoAssetAnchor {
    underlying: AssetId,
    shares: BTreeMap<AccountId, u128>,
    total_shares: u128,
}

impl KreskoAssetAnchor {
    pub fn new(underlying: AssetId) -> Self {
        Self {
            underlying,
            shares: BTreeMap::new(),
            total_shares: 0,
        }
    }

    pub fn underlying(&self) -> &AssetId {
        &self.underlying
    }

    /// Account holding the wrapped underlying
    pub fn custody(&self) -> AccountId {
        AccountId::anchor(&self.underlying)
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.shares.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_shares
    }

    /// Preview: observed underlying `assets` to shares
    pub fn convert_to_shares(
        &self,
        token: &KreskoAsset,
        assets: u128,
        rounding: Rounding,
    ) -> Result<u128, TokenError> {
        token.rebase_info().to_internal(assets, rounding)
    }

    /// Preview: shares to observed underlying
    pub fn convert_to_assets(
        &self,
        token: &KreskoAsset,
        shares: u128,
        rounding: Rounding,
    ) -> Result<u128, TokenError> {
        token.rebase_info().to_observed(shares, rounding)
    }

    /// Wrap `assets` observed tokens of `account` into shares. The account
    /// pays the internal amount rounded up and receives exactly that many
    /// shares. Returns the shares minted.
    pub fn wrap(
        &mut self,
        token: &mut KreskoAsset,
        account: &AccountId,
        assets: u128,
    ) -> Result<u128, TokenError> {
        self.check_underlying(token)?;
        if assets == 0 {
            return Err(TokenError::ZeroAmount);
        }
        let shares = self.convert_to_shares(token, assets, Rounding::Up)?;
        token.transfer_internal(account, &self.custody(), shares)?;
        self.mint_shares(account, shares)?;
        info!(asset = %self.underlying, account = %account, assets, shares, "Wrapped");
        Ok(shares)
    }

    /// Unwrap `shares` back into underlying tokens. Returns the observed
    /// amount released.
    pub fn unwrap(
        &mut self,
        token: &mut KreskoAsset,
        account: &AccountId,
        shares: u128,
    ) -> Result<u128, TokenError> {
        self.check_underlying(token)?;
        if shares == 0 {
            return Err(TokenError::ZeroAmount);
        }
        let held = self.balance_of(account);
        if shares > held {
            return Err(TokenError::InsufficientBalance {
                account: account.clone(),
                asset: self.underlying.clone(),
                available: held,
                requested: shares,
            });
        }
        token.transfer_internal(&self.custody(), account, shares)?;
        self.burn_shares(account, shares);
        let assets = self.convert_to_assets(token, shares, Rounding::Down)?;
        info!(asset = %self.underlying, account = %account, assets, shares, "Unwrapped");
        Ok(assets)
    }

    fn mint_shares(&mut self, account: &AccountId, shares: u128) -> Result<(), TokenError> {
        self.total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or(kresko_core::MathError::Overflow)?;
        *self.shares.entry(account.clone()).or_insert(0) += shares;
        Ok(())
    }

    fn burn_shares(&mut self, account: &AccountId, shares: u128) {
        let remaining = self.balance_of(account) - shares;
        if remaining == 0 {
            self.shares.remove(account);
        } else {
            self.shares.insert(account.clone(), remaining);
        }
        self.total_shares -= shares;
    }

    fn check_underlying(&self, token: &KreskoAsset) -> Result<(), TokenError> {
        if token.id() != &self.underlying {
            return Err(TokenError::UnknownToken(token.id().clone()));
        }
        Ok(())
    }
}
