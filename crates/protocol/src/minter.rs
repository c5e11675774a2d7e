//! Mint and burn of krAssets against deposited collateral

use kresko_core::{AccountId, AssetId, Rounding};
use kresko_risk::interest::principal_from_debt;
use kresko_token::RebaseLookup;
use tracing::info;

use crate::collateral::{require_positive, require_user};
use crate::error::{ProtocolResult, ValidationError};
use crate::protocol::Protocol;
use crate::vault::CollateralVault;

impl<V: CollateralVault> Protocol<V> {
    /// Mint `amount` krAsset tokens to `account`, recording the same amount
    /// of debt. The open fee is paid in the minted tokens.
    ///
    /// Checked on the staged state: mintable, market open, supply limit,
    /// minimum debt value and the minimum collateralization ratio.
    pub fn mint_kresko_asset(&mut self, account: &AccountId, asset: &AssetId, amount: u128) -> ProtocolResult<()> {
        require_user(account)?;
        require_positive(amount)?;
        let (fee, debt) = self.stage("mint_kresko_asset", |s| {
            let config = s.state.registry.kresko_asset(asset)?.clone();
            if !config.mintable {
                return Err(ValidationError::NotMintable(asset.clone()).into());
            }
            s.require_market_open(asset)?;
            let index = s.accrue(asset)?;
            s.require_supply_room(asset, amount)?;

            let internal = s.state.tokens.rebase_info(asset).to_internal(amount, Rounding::Up)?;
            let principal = principal_from_debt(internal, index, Rounding::Up)?;
            s.state.debt.add_principal(account, asset, principal)?;

            let fee = config.open_fee.mul_amount(amount, Rounding::Down)?;
            let fee_recipient = s.params().fee_recipient.clone();
            let token = s.state.tokens.token_mut(asset)?;
            if fee > 0 {
                token.mint(&fee_recipient, fee)?;
            }
            if amount > fee {
                token.mint(account, amount - fee)?;
            }

            s.require_minimum_debt(account, asset)?;
            let mcr = s.params().minimum_collateralization_ratio;
            s.require_solvent(account, mcr)?;
            Ok((fee, s.valuation().kresko_asset_debt(account, asset)?))
        })?;
        info!(account = %account, asset = %asset, amount, fee, debt, "Kresko asset minted");
        Ok(())
    }

    /// Burn `amount` tokens from `account` against its debt. The close fee
    /// is moved from the account to the fee recipient on top. `hint` is the
    /// asset's position in the minted list, checked when the debt is cleared.
    pub fn burn_kresko_asset(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
        hint: Option<usize>,
    ) -> ProtocolResult<()> {
        require_user(account)?;
        require_positive(amount)?;
        let (fee, debt) = self.stage("burn_kresko_asset", |s| {
            let close_fee = s.state.registry.kresko_asset(asset)?.close_fee;
            s.require_market_open(asset)?;
            s.accrue(asset)?;
            s.repay_debt(account, asset, amount, hint)?;

            let fee = close_fee.mul_amount(amount, Rounding::Down)?;
            let fee_recipient = s.params().fee_recipient.clone();
            let token = s.state.tokens.token_mut(asset)?;
            token.burn(account, amount)?;
            if fee > 0 {
                token.transfer(account, &fee_recipient, fee)?;
            }

            s.require_minimum_debt(account, asset)?;
            Ok((fee, s.valuation().kresko_asset_debt(account, asset)?))
        })?;
        info!(account = %account, asset = %asset, amount, fee, debt, "Kresko asset burned");
        Ok(())
    }
}
