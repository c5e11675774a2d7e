//! Kresko asset - rebasing synthetic token
//!
//! Balances and supply are stored in internal units; every public amount is
//! observed units. Allowances are stored in observed units and are never
//! rescaled by a rebase.

use kresko_core::{AccountId, AssetId, Rounding};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::TokenError;
use crate::rebase::RebaseInfo;

/// Allowance value that is never decremented
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KreskoAsset {
    id: AssetId,
    #[serde(default)]
    rebase: RebaseInfo,
    balances: BTreeMap<AccountId, u128>,
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, u128>>,
    total_internal: u128,
}

impl KreskoAsset {
    pub fn new(id: AssetId) -> Self {
        Self {
            id,
            rebase: RebaseInfo::default(),
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_internal: 0,
        }
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    pub fn rebase_info(&self) -> RebaseInfo {
        self.rebase
    }

    pub fn is_rebased(&self) -> bool {
        self.rebase.is_rebased()
    }

    /// Replace the rebase transform. Internal balances are untouched.
    pub fn rebase(&mut self, rebase: RebaseInfo) -> Result<(), TokenError> {
        let rebase = RebaseInfo::new(rebase.denominator, rebase.positive)?;
        info!(
            asset = %self.id,
            denominator = %rebase.denominator,
            positive = rebase.positive,
            "Rebase applied"
        );
        self.rebase = rebase;
        Ok(())
    }

    // === Reads ===

    pub fn balance_of(&self, account: &AccountId) -> Result<u128, TokenError> {
        self.rebase
            .to_observed(self.internal_balance_of(account), Rounding::Down)
    }

    pub fn total_supply(&self) -> Result<u128, TokenError> {
        self.rebase.to_observed(self.total_internal, Rounding::Down)
    }

    pub fn internal_balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn internal_total_supply(&self) -> u128 {
        self.total_internal
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    // === Supply ===

    /// Mint `amount` observed tokens; the account is credited the
    /// internal amount rounded down. Returns the internal amount.
    pub fn mint(&mut self, to: &AccountId, amount: u128) -> Result<u128, TokenError> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        let internal = self.rebase.to_internal(amount, Rounding::Down)?;
        self.mint_internal(to, internal)?;
        debug!(asset = %self.id, to = %to, amount, internal, "Minted");
        Ok(internal)
    }

    /// Burn `amount` observed tokens; the internal amount is rounded up.
    /// Returns the internal amount.
    pub fn burn(&mut self, from: &AccountId, amount: u128) -> Result<u128, TokenError> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }
        let internal = self.rebase.to_internal(amount, Rounding::Up)?;
        self.burn_internal(from, internal, amount)?;
        debug!(asset = %self.id, from = %from, amount, internal, "Burned");
        Ok(internal)
    }

    pub fn mint_internal(&mut self, to: &AccountId, internal: u128) -> Result<(), TokenError> {
        if internal == 0 {
            return Err(TokenError::ZeroAmount);
        }
        let total = self
            .total_internal
            .checked_add(internal)
            .ok_or(kresko_core::MathError::Overflow)?;
        let balance = self.internal_balance_of(to) + internal;
        self.total_internal = total;
        self.balances.insert(to.clone(), balance);
        Ok(())
    }

    fn burn_internal(&mut self, from: &AccountId, internal: u128, requested: u128) -> Result<(), TokenError> {
        let available = self.internal_balance_of(from);
        if internal > available {
            return Err(self.insufficient(from, available, requested));
        }
        self.set_balance(from, available - internal);
        self.total_internal -= internal;
        Ok(())
    }

    // === Transfers ===

    /// Move `amount` observed tokens. The internal amount is rounded up, so
    /// the sender covers any rounding.
    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        let internal = self.rebase.to_internal(amount, Rounding::Up)?;
        self.move_internal(from, to, internal, amount)?;
        debug!(asset = %self.id, from = %from, to = %to, amount, internal, "Transferred");
        Ok(())
    }

    /// Move internal units directly (anchor custody and collateral shares)
    pub fn transfer_internal(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        internal: u128,
    ) -> Result<(), TokenError> {
        let requested = self.rebase.to_observed(internal, Rounding::Up)?;
        self.move_internal(from, to, internal, requested)
    }

    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: u128) {
        debug!(asset = %self.id, owner = %owner, spender = %spender, amount, "Approved");
        let entries = self.allowances.entry(owner.clone()).or_default();
        if amount == 0 {
            entries.remove(spender);
            if entries.is_empty() {
                self.allowances.remove(owner);
            }
        } else {
            entries.insert(spender.clone(), amount);
        }
    }

    /// Spend `amount` of `from`'s allowance to `spender` and transfer it to `to`.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                allowance,
                requested: amount,
            });
        }
        self.transfer(from, to, amount)?;
        if allowance != UNLIMITED_ALLOWANCE {
            self.approve(from, spender, allowance - amount);
        }
        Ok(())
    }

    fn move_internal(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        internal: u128,
        requested: u128,
    ) -> Result<(), TokenError> {
        let available = self.internal_balance_of(from);
        if internal > available {
            return Err(self.insufficient(from, available, requested));
        }
        if from == to || internal == 0 {
            return Ok(());
        }
        self.set_balance(from, available - internal);
        let received = self.internal_balance_of(to) + internal;
        self.balances.insert(to.clone(), received);
        Ok(())
    }

    fn set_balance(&mut self, account: &AccountId, internal: u128) {
        if internal == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), internal);
        }
    }

    fn insufficient(&self, account: &AccountId, available_internal: u128, requested: u128) -> TokenError {
        TokenError::InsufficientBalance {
            account: account.clone(),
            asset: self.id.clone(),
            available: self
                .rebase
                .to_observed(available_internal, Rounding::Down)
                .unwrap_or(0),
            requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kresko_core::amount::units;
    use kresko_core::Wad;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const MINT: u128 = 100_000_000_000_000_000_000; // 100 tokens

    fn token() -> (KreskoAsset, AccountId, AccountId) {
        let mut token = KreskoAsset::new("krTSLA".into());
        let deployer = AccountId::from("deployer");
        let user = AccountId::from("user");
        token.mint(&deployer, MINT).unwrap();
        (token, deployer, user)
    }

    fn rebase(denominator: u128, positive: bool) -> RebaseInfo {
        RebaseInfo::new(Wad::from_int(denominator).unwrap(), positive).unwrap()
    }

    #[test]
    fn test_no_effect_when_not_rebased() {
        let (token, deployer, _) = token();
        assert!(!token.is_rebased());
        assert_eq!(token.balance_of(&deployer).unwrap(), MINT);
        assert_eq!(token.total_supply().unwrap(), MINT);
    }

    #[test]
    fn test_positive_rebase_scales_balance_and_supply() {
        for denominator in [2u128, 3, 100] {
            let (mut token, deployer, _) = token();
            token.rebase(rebase(denominator, true)).unwrap();
            assert_eq!(token.balance_of(&deployer).unwrap(), MINT * denominator);
            assert_eq!(token.total_supply().unwrap(), MINT * denominator);
        }
    }

    #[test]
    fn test_negative_rebase_scales_balance_and_supply() {
        for denominator in [2u128, 3, 100] {
            let (mut token, deployer, _) = token();
            token.rebase(rebase(denominator, false)).unwrap();
            assert_eq!(token.balance_of(&deployer).unwrap(), MINT / denominator);
            assert_eq!(token.total_supply().unwrap(), MINT / denominator);
        }
    }

    #[test]
    fn test_transfer_after_rebase() {
        let transfer = units(1, 18).unwrap();
        for positive in [true, false] {
            let (mut token, deployer, user) = token();
            token.mint(&user, MINT).unwrap();
            token.rebase(rebase(2, positive)).unwrap();
            let rebased = if positive { MINT * 2 } else { MINT / 2 };

            token.transfer(&deployer, &user, transfer).unwrap();
            assert_eq!(token.balance_of(&user).unwrap(), rebased + transfer);
            assert_eq!(token.balance_of(&deployer).unwrap(), rebased - transfer);
        }
    }

    #[test]
    fn test_transfer_from_exhausts_allowance() {
        let transfer = units(1, 18).unwrap();
        for denominator in [2u128, 100] {
            let (mut token, deployer, user) = token();
            token.mint(&user, MINT).unwrap();
            token.rebase(rebase(denominator, true)).unwrap();
            token.approve(&deployer, &user, transfer);

            token.transfer_from(&user, &deployer, &user, transfer).unwrap();
            assert_eq!(token.balance_of(&user).unwrap(), MINT * denominator + transfer);
            assert_eq!(token.balance_of(&deployer).unwrap(), MINT * denominator - transfer);
            assert_eq!(token.allowance(&deployer, &user), 0);

            let again = token.transfer_from(&user, &deployer, &user, transfer);
            assert!(matches!(again, Err(TokenError::InsufficientAllowance { .. })));
            assert_eq!(token.allowance(&deployer, &user), 0);
        }
    }

    #[test]
    fn test_allowance_is_not_rescaled_by_rebase() {
        let (mut token, deployer, user) = token();
        token.approve(&deployer, &user, 500);
        token.rebase(rebase(3, false)).unwrap();
        assert_eq!(token.allowance(&deployer, &user), 500);
    }

    #[test]
    fn test_unlimited_allowance() {
        let (mut token, deployer, user) = token();
        token.approve(&deployer, &user, UNLIMITED_ALLOWANCE);
        token.transfer_from(&user, &deployer, &user, 10).unwrap();
        assert_eq!(token.allowance(&deployer, &user), UNLIMITED_ALLOWANCE);
    }

    #[test]
    fn test_failed_transfer_from_keeps_allowance() {
        let (mut token, deployer, user) = token();
        token.approve(&deployer, &user, MINT * 2);
        let result = token.transfer_from(&user, &deployer, &user, MINT + 1);
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(token.allowance(&deployer, &user), MINT * 2);
    }

    #[test]
    fn test_reset_to_identity_restores_balances() {
        let (mut token, deployer, _) = token();
        token.rebase(rebase(7, true)).unwrap();
        token.rebase(RebaseInfo::default()).unwrap();
        assert_eq!(token.balance_of(&deployer).unwrap(), MINT);
    }

    #[test]
    fn test_burn_rounds_against_burner() {
        let (mut token, deployer, _) = token();
        token.rebase(rebase(3, true)).unwrap();
        // 1 observed unit costs a whole internal unit
        assert_eq!(token.burn(&deployer, 1).unwrap(), 1);
        assert_eq!(token.internal_balance_of(&deployer), MINT - 1);
    }

    #[test]
    fn test_random_transfers_conserve_supply() {
        let mut rng = StdRng::seed_from_u64(42);
        let accounts: Vec<AccountId> = ["a", "b", "c", "d"].iter().map(|s| AccountId::from(*s)).collect();
        let mut token = KreskoAsset::new("krETH".into());
        for account in &accounts {
            token.mint(account, MINT).unwrap();
        }

        for _ in 0..200 {
            if rng.gen_bool(0.1) {
                let denominator = Wad::from_raw_u128(rng.gen_range(1_000_000_000_000_000_000..5_000_000_000_000_000_000));
                token.rebase(RebaseInfo::new(denominator, rng.gen_bool(0.5)).unwrap()).unwrap();
            }
            let from = &accounts[rng.gen_range(0..accounts.len())];
            let to = &accounts[rng.gen_range(0..accounts.len())];
            let balance = token.balance_of(from).unwrap();
            if balance == 0 {
                continue;
            }
            let amount = rng.gen_range(0..=balance);
            let before = token.internal_balance_of(from) + token.internal_balance_of(to);
            token.transfer(from, to, amount).unwrap();
            let after = token.internal_balance_of(from) + token.internal_balance_of(to);
            assert_eq!(before, after);

            let sum: u128 = accounts.iter().map(|a| token.internal_balance_of(a)).sum();
            assert_eq!(sum, token.internal_total_supply());
        }
    }
}
