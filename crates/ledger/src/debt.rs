//! Debt Ledger - krAsset positions stored as index-scaled principal
//!
//! The owed amount is `principal * debt index`; the index lives in the
//! risk crate and is applied by the caller.

use kresko_core::{AccountId, AssetId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::book::PositionBook;
use crate::error::LedgerError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebtLedger {
    book: PositionBook,
}

impl DebtLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_principal(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        principal: u128,
    ) -> Result<u128, LedgerError> {
        let total = self.book.increase(account, asset, principal)?;
        debug!(account = %account, asset = %asset, principal, total, "Principal added");
        Ok(total)
    }

    /// Reduce principal; a fully repaid position is delisted using `hint`.
    pub fn remove_principal(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        principal: u128,
        hint: Option<usize>,
    ) -> Result<u128, LedgerError> {
        let total = self.book.decrease(account, asset, principal, hint)?;
        debug!(account = %account, asset = %asset, principal, total, "Principal removed");
        Ok(total)
    }

    pub fn principal(&self, account: &AccountId, asset: &AssetId) -> u128 {
        self.book.amount(account, asset)
    }

    /// Assets the account has minted, in list order
    pub fn minted_assets(&self, account: &AccountId) -> &[AssetId] {
        self.book.assets(account)
    }

    /// Current list index of `asset`; shifts after any removal
    pub fn minted_index(&self, account: &AccountId, asset: &AssetId) -> Option<usize> {
        self.book.index_of(account, asset)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.book.accounts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_per_account_are_independent() {
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");
        let tsla = AssetId::from("krTSLA");
        let mut ledger = DebtLedger::new();

        ledger.add_principal(&alice, &tsla, 1_000).unwrap();
        ledger.add_principal(&bob, &tsla, 7).unwrap();
        ledger.remove_principal(&alice, &tsla, 1_000, Some(0)).unwrap();

        assert_eq!(ledger.principal(&alice, &tsla), 0);
        assert!(ledger.minted_assets(&alice).is_empty());
        assert_eq!(ledger.principal(&bob, &tsla), 7);
        assert_eq!(ledger.accounts().collect::<Vec<_>>(), vec![&bob]);
    }

    #[test]
    fn test_minted_index_shifts_after_removal() {
        let alice = AccountId::from("alice");
        let (a, b, c) = (AssetId::from("krA"), AssetId::from("krB"), AssetId::from("krC"));
        let mut ledger = DebtLedger::new();
        for asset in [&a, &b, &c] {
            ledger.add_principal(&alice, asset, 10).unwrap();
        }

        assert_eq!(ledger.minted_index(&alice, &c), Some(2));
        ledger.remove_principal(&alice, &a, 10, None).unwrap();
        assert_eq!(ledger.minted_index(&alice, &c), Some(0));
        assert_eq!(ledger.minted_assets(&alice), &[c.clone(), b.clone()]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut ledger = DebtLedger::new();
        ledger.add_principal(&"alice".into(), &"krETH".into(), 42).unwrap();

        let json = serde_json::to_string(&ledger).unwrap();
        let parsed: DebtLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ledger);
        assert_eq!(parsed.minted_index(&"alice".into(), &"krETH".into()), Some(0));
    }
}
