//! krAsset token surface: transfers, allowances and anchor wrapping
//!
//! Reserved accounts hold the units backing anchored collateral and anchor
//! shares, so none of these entry points may debit them.

use kresko_core::{AccountId, AssetId};
use tracing::info;

use crate::collateral::{require_positive, require_user};
use crate::error::ProtocolResult;
use crate::protocol::Protocol;
use crate::vault::CollateralVault;

impl<V: CollateralVault> Protocol<V> {
    pub fn transfer(&mut self, asset: &AssetId, from: &AccountId, to: &AccountId, amount: u128) -> ProtocolResult<()> {
        require_user(from)?;
        require_positive(amount)?;
        self.stage("transfer", |s| {
            s.state.tokens.token_mut(asset)?.transfer(from, to, amount)?;
            Ok(())
        })?;
        info!(asset = %asset, from = %from, to = %to, amount, "Transferred");
        Ok(())
    }

    /// Set the allowance of `spender` over `owner`'s tokens, in observed units
    pub fn approve(&mut self, asset: &AssetId, owner: &AccountId, spender: &AccountId, amount: u128) -> ProtocolResult<()> {
        require_user(owner)?;
        require_user(spender)?;
        self.stage("approve", |s| {
            s.state.tokens.token_mut(asset)?.approve(owner, spender, amount);
            Ok(())
        })
    }

    pub fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> ProtocolResult<()> {
        require_user(spender)?;
        require_user(from)?;
        require_positive(amount)?;
        self.stage("transfer_from", |s| {
            s.state
                .tokens
                .token_mut(asset)?
                .transfer_from(spender, from, to, amount)?;
            Ok(())
        })?;
        info!(asset = %asset, spender = %spender, from = %from, to = %to, amount, "Transferred from");
        Ok(())
    }

    /// Wrap observed krAsset tokens into anchor shares. Returns the shares.
    pub fn wrap(&mut self, account: &AccountId, asset: &AssetId, amount: u128) -> ProtocolResult<u128> {
        require_user(account)?;
        self.stage("wrap", |s| {
            let (token, anchor) = s.state.tokens.pair_mut(asset)?;
            Ok(anchor.wrap(token, account, amount)?)
        })
    }

    /// Unwrap anchor shares. Returns the observed tokens released.
    pub fn unwrap(&mut self, account: &AccountId, asset: &AssetId, shares: u128) -> ProtocolResult<u128> {
        require_user(account)?;
        self.stage("unwrap", |s| {
            let (token, anchor) = s.state.tokens.pair_mut(asset)?;
            Ok(anchor.unwrap(token, account, shares)?)
        })
    }
}
