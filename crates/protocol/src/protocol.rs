//! Protocol context - composes registry, ledgers, tokens, oracle and custody
//!
//! ```text
//! operation
//!     │
//!     ▼
//! ┌──────────────────────┐
//! │ clone live state     │
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ validate, mutate,    │──► Err? drop the copy
//! │ re-check invariants  │
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ settle vault         │──► Err? drop the copy
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ swap in staged state │
//! └──────────────────────┘
//! ```

use std::sync::Arc;

use kresko_core::{AccountId, AssetId, Wad};
use kresko_oracle::PriceOracle;
use kresko_registry::{
    AccessControl, CollateralAssetConfig, DebtAssetConfig, ProtocolParams, Role, StabilityRateConfig,
};
use kresko_token::RebaseInfo;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{ProtocolError, ProtocolResult, ValidationError};
use crate::state::{ProtocolState, Staged};
use crate::vault::{CollateralVault, InMemoryVault};

pub struct Protocol<V: CollateralVault = InMemoryVault> {
    pub(crate) state: ProtocolState,
    pub(crate) oracle: Arc<dyn PriceOracle>,
    access: Arc<dyn AccessControl>,
    pub(crate) vault: V,
    pub(crate) clock: Arc<dyn Clock>,
}

impl<V: CollateralVault> Protocol<V> {
    /// Fresh protocol with no listed assets
    pub fn new(
        params: ProtocolParams,
        oracle: Arc<dyn PriceOracle>,
        access: Arc<dyn AccessControl>,
        vault: V,
        clock: Arc<dyn Clock>,
    ) -> ProtocolResult<Self> {
        Ok(Self::from_state(
            ProtocolState::new(params)?,
            oracle,
            access,
            vault,
            clock,
        ))
    }

    /// Resume from previously persisted state
    pub fn from_state(
        state: ProtocolState,
        oracle: Arc<dyn PriceOracle>,
        access: Arc<dyn AccessControl>,
        vault: V,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            oracle,
            access,
            vault,
            clock,
        }
    }

    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }

    pub fn into_parts(self) -> (ProtocolState, V) {
        (self.state, self.vault)
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Run `op` against a copy of the state. The copy and its vault
    /// transfers are committed together only if everything succeeds.
    pub(crate) fn stage<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Staged<'_>) -> ProtocolResult<T>,
    ) -> ProtocolResult<T> {
        let oracle = Arc::clone(&self.oracle);
        let mut staged = Staged {
            state: self.state.clone(),
            oracle: oracle.as_ref(),
            now: self.clock.now(),
            transfers: Vec::new(),
        };

        let result = op(&mut staged).and_then(|value| {
            if !staged.transfers.is_empty() {
                self.vault.settle(&staged.transfers)?;
            }
            Ok(value)
        });
        match result {
            Ok(value) => {
                self.state = staged.state;
                Ok(value)
            }
            Err(err) => {
                warn!(operation, error = %err, "Operation rejected");
                Err(err)
            }
        }
    }

    pub(crate) fn require_role(&self, caller: &AccountId, role: Role) -> ProtocolResult<()> {
        if !self.access.has_role(caller, role) {
            warn!(account = %caller, role = %role, "Unauthorized");
            return Err(ProtocolError::Unauthorized {
                account: caller.clone(),
                role,
            });
        }
        Ok(())
    }

    // === Registry administration ===

    pub fn add_collateral_asset(
        &mut self,
        caller: &AccountId,
        asset: AssetId,
        config: CollateralAssetConfig,
    ) -> ProtocolResult<()> {
        self.require_role(caller, Role::Operator)?;
        self.stage("add_collateral_asset", |s| {
            s.state.registry.add_collateral(asset, config)?;
            Ok(())
        })
    }

    pub fn update_collateral_asset(
        &mut self,
        caller: &AccountId,
        asset: &AssetId,
        config: CollateralAssetConfig,
    ) -> ProtocolResult<()> {
        self.require_role(caller, Role::Operator)?;
        self.stage("update_collateral_asset", |s| {
            s.state.registry.update_collateral(asset, config)?;
            Ok(())
        })
    }

    /// List a krAsset, creating its rebasing token and anchor and starting
    /// its debt index at 1
    pub fn add_kresko_asset(
        &mut self,
        caller: &AccountId,
        asset: AssetId,
        config: DebtAssetConfig,
    ) -> ProtocolResult<()> {
        self.require_role(caller, Role::Operator)?;
        self.stage("add_kresko_asset", |s| {
            let base_rate = config.stability.base_rate;
            s.state.registry.add_kresko_asset(asset.clone(), config)?;
            s.state.tokens.create(&asset)?;
            s.state.indexes.init(&asset, base_rate, s.now);
            Ok(())
        })
    }

    pub fn update_kresko_asset(
        &mut self,
        caller: &AccountId,
        asset: &AssetId,
        config: DebtAssetConfig,
    ) -> ProtocolResult<()> {
        self.require_role(caller, Role::Operator)?;
        self.stage("update_kresko_asset", |s| {
            s.accrue(asset)?;
            s.state.registry.update_kresko_asset(asset, config)?;
            s.accrue(asset)?;
            Ok(())
        })
    }

    /// Accrue at the old rate up to now, then switch to the new parameters
    pub fn setup_stability_rate_params(
        &mut self,
        caller: &AccountId,
        asset: &AssetId,
        stability: StabilityRateConfig,
    ) -> ProtocolResult<()> {
        self.require_role(caller, Role::Operator)?;
        self.stage("setup_stability_rate_params", |s| {
            s.accrue(asset)?;
            s.state.registry.set_stability_rate(asset, stability)?;
            s.accrue(asset)?;
            Ok(())
        })
    }

    // === Protocol parameters ===

    pub fn update_params(&mut self, caller: &AccountId, params: ProtocolParams) -> ProtocolResult<()> {
        self.require_role(caller, Role::Admin)?;
        self.stage("update_params", |s| {
            s.state.registry.set_params(params)?;
            Ok(())
        })
    }

    fn update_param(
        &mut self,
        caller: &AccountId,
        change: impl FnOnce(&mut ProtocolParams),
    ) -> ProtocolResult<()> {
        let mut params = self.state.registry.params().clone();
        change(&mut params);
        self.update_params(caller, params)
    }

    pub fn set_minimum_collateralization_ratio(&mut self, caller: &AccountId, value: Wad) -> ProtocolResult<()> {
        self.update_param(caller, |p| p.minimum_collateralization_ratio = value)
    }

    pub fn set_liquidation_threshold(&mut self, caller: &AccountId, value: Wad) -> ProtocolResult<()> {
        self.update_param(caller, |p| p.liquidation_threshold = value)
    }

    pub fn set_liquidation_incentive_multiplier(&mut self, caller: &AccountId, value: Wad) -> ProtocolResult<()> {
        self.update_param(caller, |p| p.liquidation_incentive_multiplier = value)
    }

    pub fn set_minimum_debt_value(&mut self, caller: &AccountId, value: Wad) -> ProtocolResult<()> {
        self.update_param(caller, |p| p.minimum_debt_value = value)
    }

    pub fn set_fee_recipient(&mut self, caller: &AccountId, recipient: AccountId) -> ProtocolResult<()> {
        self.update_param(caller, |p| p.fee_recipient = recipient)
    }

    // === Rebase ===

    /// Replace the rebase of `asset`. Balances, allowances and debt keep
    /// their internal amounts; observed amounts follow the new rebase.
    pub fn rebase(
        &mut self,
        caller: &AccountId,
        asset: &AssetId,
        denominator: Wad,
        positive: bool,
    ) -> ProtocolResult<()> {
        self.require_role(caller, Role::Admin)?;
        self.stage("rebase", |s| {
            if !s.state.registry.is_kresko_asset(asset) {
                return Err(ValidationError::UnknownKreskoAsset(asset.clone()).into());
            }
            s.accrue(asset)?;
            let rebase = RebaseInfo::new(denominator, positive)?;
            s.state.tokens.token_mut(asset)?.rebase(rebase)?;
            Ok(())
        })?;
        info!(caller = %caller, asset = %asset, denominator = %denominator, positive, "Rebase committed");
        Ok(())
    }
}
