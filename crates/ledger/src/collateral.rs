//! Collateral Ledger - raw deposited amounts in asset-native decimals

use kresko_core::{AccountId, AssetId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::book::PositionBook;
use crate::error::LedgerError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollateralLedger {
    book: PositionBook,
}

impl CollateralLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a deposit. Returns the new deposited amount.
    pub fn deposit(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<u128, LedgerError> {
        let balance = self.book.increase(account, asset, amount)?;
        debug!(account = %account, asset = %asset, amount, balance, "Collateral credited");
        Ok(balance)
    }

    /// Debit a deposit; a full withdrawal delists the asset using `hint`.
    pub fn withdraw(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
        hint: Option<usize>,
    ) -> Result<u128, LedgerError> {
        let balance = self.book.decrease(account, asset, amount, hint)?;
        debug!(account = %account, asset = %asset, amount, balance, "Collateral debited");
        Ok(balance)
    }

    pub fn deposits(&self, account: &AccountId, asset: &AssetId) -> u128 {
        self.book.amount(account, asset)
    }

    /// Assets the account has a non-zero deposit in, in list order
    pub fn deposited_assets(&self, account: &AccountId) -> &[AssetId] {
        self.book.assets(account)
    }

    /// Current list index of `asset`; shifts after any removal
    pub fn deposited_index(&self, account: &AccountId, asset: &AssetId) -> Option<usize> {
        self.book.index_of(account, asset)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.book.accounts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (AccountId, AssetId, AssetId) {
        ("alice".into(), "USDC".into(), "WETH".into())
    }

    #[test]
    fn test_deposit_lists_asset_once() {
        let (alice, usdc, _) = ids();
        let mut ledger = CollateralLedger::new();

        assert_eq!(ledger.deposit(&alice, &usdc, 100).unwrap(), 100);
        assert_eq!(ledger.deposit(&alice, &usdc, 50).unwrap(), 150);
        assert_eq!(ledger.deposited_assets(&alice), &[usdc.clone()]);
        assert_eq!(ledger.deposited_index(&alice, &usdc), Some(0));
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let (alice, usdc, _) = ids();
        let mut ledger = CollateralLedger::new();
        assert_eq!(ledger.deposit(&alice, &usdc, 0), Err(LedgerError::ZeroAmount));
        assert!(ledger.deposited_assets(&alice).is_empty());
    }

    #[test]
    fn test_partial_withdraw_keeps_listing() {
        let (alice, usdc, _) = ids();
        let mut ledger = CollateralLedger::new();
        ledger.deposit(&alice, &usdc, 100).unwrap();

        assert_eq!(ledger.withdraw(&alice, &usdc, 40, Some(0)).unwrap(), 60);
        assert_eq!(ledger.withdraw(&alice, &usdc, 10, None).unwrap(), 50);
        assert_eq!(ledger.deposits(&alice, &usdc), 50);
        assert_eq!(ledger.deposited_assets(&alice).len(), 1);
    }

    #[test]
    fn test_stale_hint_rejected_on_partial_withdraw() {
        let (alice, usdc, _) = ids();
        let mut ledger = CollateralLedger::new();
        ledger.deposit(&alice, &usdc, 100).unwrap();
        let before = ledger.clone();

        assert_eq!(
            ledger.withdraw(&alice, &usdc, 40, Some(9)),
            Err(LedgerError::StaleIndex {
                asset: usdc.clone(),
                supplied: 9,
                current: Some(0),
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_full_withdraw_swap_removes() {
        let (alice, usdc, weth) = ids();
        let mut ledger = CollateralLedger::new();
        ledger.deposit(&alice, &usdc, 100).unwrap();
        ledger.deposit(&alice, &weth, 5).unwrap();

        let index = ledger.deposited_index(&alice, &usdc);
        assert_eq!(ledger.withdraw(&alice, &usdc, 100, index).unwrap(), 0);
        assert_eq!(ledger.deposited_assets(&alice), &[weth.clone()]);
        assert_eq!(ledger.deposited_index(&alice, &weth), Some(0));
    }

    #[test]
    fn test_stale_hint_leaves_state_untouched() {
        let (alice, usdc, weth) = ids();
        let mut ledger = CollateralLedger::new();
        ledger.deposit(&alice, &usdc, 100).unwrap();
        ledger.deposit(&alice, &weth, 5).unwrap();
        let before = ledger.clone();

        let result = ledger.withdraw(&alice, &usdc, 100, Some(1));
        assert!(matches!(result, Err(LedgerError::StaleIndex { .. })));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_overdraw_rejected() {
        let (alice, usdc, _) = ids();
        let mut ledger = CollateralLedger::new();
        ledger.deposit(&alice, &usdc, 10).unwrap();
        assert_eq!(
            ledger.withdraw(&alice, &usdc, 11, None),
            Err(LedgerError::InsufficientBalance {
                account: alice.clone(),
                asset: usdc.clone(),
                available: 10,
                requested: 11,
            })
        );
    }

    #[test]
    fn test_empty_account_is_dropped() {
        let (alice, usdc, _) = ids();
        let mut ledger = CollateralLedger::new();
        ledger.deposit(&alice, &usdc, 10).unwrap();
        ledger.withdraw(&alice, &usdc, 10, None).unwrap();
        assert_eq!(ledger.accounts().count(), 0);
        assert_eq!(ledger, CollateralLedger::new());
    }
}
