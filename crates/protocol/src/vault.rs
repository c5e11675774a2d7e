//! External collateral custody
//!
//! The ledgers record who owns what inside the protocol. A
//! [`CollateralVault`] moves the underlying collateral tokens between
//! account wallets and protocol custody. The protocol settles the vault
//! only after its own ledgers are updated, and drops the ledger changes if
//! the vault refuses.

use kresko_core::{AccountId, AssetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::VaultError;

/// One movement between a wallet and custody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VaultTransfer {
    /// Wallet into custody
    Pull {
        from: AccountId,
        asset: AssetId,
        amount: u128,
    },
    /// Custody out to a wallet
    Push {
        to: AccountId,
        asset: AssetId,
        amount: u128,
    },
}

pub trait CollateralVault: Send + Sync {
    /// Apply every transfer or none of them
    fn settle(&mut self, transfers: &[VaultTransfer]) -> Result<(), VaultError>;

    /// Wallet balance outside the protocol
    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> u128;

    /// Collateral held in custody
    fn custody_balance(&self, asset: &AssetId) -> u128;
}

/// Wallets and custody kept in memory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryVault {
    wallets: BTreeMap<AccountId, BTreeMap<AssetId, u128>>,
    custody: BTreeMap<AssetId, u128>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a wallet from outside the system
    pub fn fund(&mut self, account: &AccountId, asset: &AssetId, amount: u128) -> Result<u128, VaultError> {
        let balance = self.balance_of(account, asset);
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| VaultError::Overflow(asset.clone()))?;
        self.set_wallet(account, asset, updated);
        debug!(account = %account, asset = %asset, amount, balance = updated, "Wallet funded");
        Ok(updated)
    }

    fn set_wallet(&mut self, account: &AccountId, asset: &AssetId, amount: u128) {
        let wallet = self.wallets.entry(account.clone()).or_default();
        if amount == 0 {
            wallet.remove(asset);
            if wallet.is_empty() {
                self.wallets.remove(account);
            }
        } else {
            wallet.insert(asset.clone(), amount);
        }
    }

    fn apply(&mut self, transfer: &VaultTransfer) -> Result<(), VaultError> {
        match transfer {
            VaultTransfer::Pull { from, asset, amount } => {
                let available = self.balance_of(from, asset);
                let remaining = available
                    .checked_sub(*amount)
                    .ok_or_else(|| VaultError::InsufficientFunds {
                        account: from.clone(),
                        asset: asset.clone(),
                        available,
                        requested: *amount,
                    })?;
                let held = self
                    .custody_balance(asset)
                    .checked_add(*amount)
                    .ok_or_else(|| VaultError::Overflow(asset.clone()))?;
                self.set_wallet(from, asset, remaining);
                self.custody.insert(asset.clone(), held);
            }
            VaultTransfer::Push { to, asset, amount } => {
                let held = self.custody_balance(asset);
                let remaining = held
                    .checked_sub(*amount)
                    .ok_or_else(|| VaultError::CustodyShortfall {
                        asset: asset.clone(),
                        held,
                        requested: *amount,
                    })?;
                let balance = self
                    .balance_of(to, asset)
                    .checked_add(*amount)
                    .ok_or_else(|| VaultError::Overflow(asset.clone()))?;
                self.custody.insert(asset.clone(), remaining);
                self.set_wallet(to, asset, balance);
            }
        }
        Ok(())
    }
}

impl CollateralVault for InMemoryVault {
    fn settle(&mut self, transfers: &[VaultTransfer]) -> Result<(), VaultError> {
        let mut staged = self.clone();
        for transfer in transfers {
            staged.apply(transfer)?;
        }
        *self = staged;
        Ok(())
    }

    fn balance_of(&self, account: &AccountId, asset: &AssetId) -> u128 {
        self.wallets
            .get(account)
            .and_then(|w| w.get(asset))
            .copied()
            .unwrap_or(0)
    }

    fn custody_balance(&self, asset: &AssetId) -> u128 {
        self.custody.get(asset).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pull(from: &str, amount: u128) -> VaultTransfer {
        VaultTransfer::Pull {
            from: from.into(),
            asset: "USDC".into(),
            amount,
        }
    }

    fn push(to: &str, amount: u128) -> VaultTransfer {
        VaultTransfer::Push {
            to: to.into(),
            asset: "USDC".into(),
            amount,
        }
    }

    #[test]
    fn test_pull_and_push() {
        let mut vault = InMemoryVault::new();
        let usdc = AssetId::from("USDC");
        vault.fund(&"alice".into(), &usdc, 100).unwrap();

        vault.settle(&[pull("alice", 60), push("bob", 10)]).unwrap();
        assert_eq!(vault.balance_of(&"alice".into(), &usdc), 40);
        assert_eq!(vault.balance_of(&"bob".into(), &usdc), 10);
        assert_eq!(vault.custody_balance(&usdc), 50);
    }

    #[test]
    fn test_settle_is_all_or_nothing() {
        let mut vault = InMemoryVault::new();
        let usdc = AssetId::from("USDC");
        vault.fund(&"alice".into(), &usdc, 100).unwrap();

        let err = vault.settle(&[pull("alice", 60), push("bob", 70)]).unwrap_err();
        assert_eq!(
            err,
            VaultError::CustodyShortfall {
                asset: usdc.clone(),
                held: 60,
                requested: 70
            }
        );
        assert_eq!(vault.balance_of(&"alice".into(), &usdc), 100);
        assert_eq!(vault.custody_balance(&usdc), 0);
    }

    #[test]
    fn test_insufficient_wallet() {
        let mut vault = InMemoryVault::new();
        let err = vault.settle(&[pull("alice", 1)]).unwrap_err();
        assert!(matches!(err, VaultError::InsufficientFunds { available: 0, .. }));
    }
}
