//! Read-only queries
//!
//! Values are computed at the current clock and fresh oracle prices.
//! Index getters return positions that shift after any removal, so read
//! them right before the call that takes them.

use kresko_core::{AccountId, AssetId, Ray, Rounding, Wad};
use kresko_risk::liquidation::{max_liquidatable_value, max_repay_amount};
use kresko_risk::{AccountHealth, Valuation};
use kresko_token::{KreskoAsset, RebaseInfo};

use crate::error::ProtocolResult;
use crate::protocol::Protocol;
use crate::vault::CollateralVault;

impl<V: CollateralVault> Protocol<V> {
    pub fn valuation(&self) -> Valuation<'_> {
        self.state.valuation(self.oracle.as_ref(), self.clock.now())
    }

    // === Account values ===

    pub fn account_collateral_value(&self, account: &AccountId) -> ProtocolResult<Wad> {
        Ok(self.valuation().account_collateral_value(account)?)
    }

    pub fn account_kr_asset_value(&self, account: &AccountId) -> ProtocolResult<Wad> {
        Ok(self.valuation().account_debt_value(account)?)
    }

    pub fn account_minimum_collateral_value_at_ratio(&self, account: &AccountId, ratio: Wad) -> ProtocolResult<Wad> {
        Ok(self.valuation().min_collateral_value_at_ratio(account, ratio)?)
    }

    /// `None` without debt
    pub fn account_collateral_ratio(&self, account: &AccountId) -> ProtocolResult<Option<Wad>> {
        Ok(self.valuation().collateral_ratio(account)?)
    }

    pub fn account_health(&self, account: &AccountId) -> ProtocolResult<AccountHealth> {
        Ok(self.valuation().health(account)?)
    }

    pub fn is_liquidatable(&self, account: &AccountId) -> ProtocolResult<bool> {
        Ok(self.valuation().is_liquidatable(account)?)
    }

    pub fn max_liquidatable_value(
        &self,
        account: &AccountId,
        repay_asset: &AssetId,
        seize_asset: &AssetId,
    ) -> ProtocolResult<Wad> {
        Ok(max_liquidatable_value(&self.valuation(), account, repay_asset, seize_asset)?)
    }

    /// Max liquidatable value in repay asset tokens
    pub fn max_repay_amount(
        &self,
        account: &AccountId,
        repay_asset: &AssetId,
        seize_asset: &AssetId,
    ) -> ProtocolResult<u128> {
        Ok(max_repay_amount(&self.valuation(), account, repay_asset, seize_asset)?)
    }

    // === Positions ===

    /// Deposit in native units
    pub fn collateral_deposits(&self, account: &AccountId, asset: &AssetId) -> ProtocolResult<u128> {
        Ok(self.valuation().collateral_deposits(account, asset)?)
    }

    pub fn deposited_collateral_assets(&self, account: &AccountId) -> &[AssetId] {
        self.state.collateral.deposited_assets(account)
    }

    pub fn deposited_collateral_index(&self, account: &AccountId, asset: &AssetId) -> Option<usize> {
        self.state.collateral.deposited_index(account, asset)
    }

    /// Debt in observed tokens, interest included
    pub fn kresko_asset_debt(&self, account: &AccountId, asset: &AssetId) -> ProtocolResult<u128> {
        Ok(self.valuation().kresko_asset_debt(account, asset)?)
    }

    pub fn minted_kresko_assets(&self, account: &AccountId) -> &[AssetId] {
        self.state.debt.minted_assets(account)
    }

    pub fn minted_kresko_asset_index(&self, account: &AccountId, asset: &AssetId) -> Option<usize> {
        self.state.debt.minted_index(account, asset)
    }

    pub fn debt_index(&self, asset: &AssetId) -> ProtocolResult<Ray> {
        Ok(self.state.indexes.current(asset, self.clock.now())?)
    }

    // === Asset values ===

    pub fn kr_asset_value(&self, asset: &AssetId, amount: u128, ignore_k_factor: bool) -> ProtocolResult<Wad> {
        Ok(self.valuation().kr_asset_value(asset, amount, ignore_k_factor)?)
    }

    /// Collateral value and the oracle price it was computed with
    pub fn collateral_value_and_oracle_price(
        &self,
        asset: &AssetId,
        amount: u128,
        ignore_factor: bool,
    ) -> ProtocolResult<(Wad, Wad)> {
        Ok(self.valuation().collateral_value_and_price(asset, amount, ignore_factor)?)
    }

    // === Tokens ===

    pub fn kresko_asset_token(&self, asset: &AssetId) -> ProtocolResult<&KreskoAsset> {
        Ok(self.state.tokens.token(asset)?)
    }

    pub fn balance_of(&self, asset: &AssetId, account: &AccountId) -> ProtocolResult<u128> {
        Ok(self.kresko_asset_token(asset)?.balance_of(account)?)
    }

    pub fn total_supply(&self, asset: &AssetId) -> ProtocolResult<u128> {
        Ok(self.kresko_asset_token(asset)?.total_supply()?)
    }

    pub fn allowance(&self, asset: &AssetId, owner: &AccountId, spender: &AccountId) -> ProtocolResult<u128> {
        Ok(self.kresko_asset_token(asset)?.allowance(owner, spender))
    }

    pub fn rebase_info(&self, asset: &AssetId) -> ProtocolResult<RebaseInfo> {
        Ok(self.kresko_asset_token(asset)?.rebase_info())
    }

    pub fn is_rebased(&self, asset: &AssetId) -> ProtocolResult<bool> {
        Ok(self.kresko_asset_token(asset)?.is_rebased())
    }

    pub fn anchor_balance_of(&self, asset: &AssetId, account: &AccountId) -> ProtocolResult<u128> {
        Ok(self.state.tokens.anchor(asset)?.balance_of(account))
    }

    /// Preview of `wrap`
    pub fn convert_to_shares(&self, asset: &AssetId, assets: u128) -> ProtocolResult<u128> {
        let token = self.kresko_asset_token(asset)?;
        Ok(self.state.tokens.anchor(asset)?.convert_to_shares(token, assets, Rounding::Up)?)
    }

    /// Preview of `unwrap`
    pub fn convert_to_assets(&self, asset: &AssetId, shares: u128) -> ProtocolResult<u128> {
        let token = self.kresko_asset_token(asset)?;
        Ok(self.state.tokens.anchor(asset)?.convert_to_assets(token, shares, Rounding::Down)?)
    }
}
