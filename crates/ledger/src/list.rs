//! Indexed asset list - ordered, gap-free list with O(1) swap-remove
//!
//! Mirrors the "assets this account holds" arrays: removal swaps the last
//! entry into the freed slot, so positions shift after any removal. A
//! position map makes lookups O(1) and lets callers' hints be revalidated.

use kresko_core::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LedgerError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<AssetId>", into = "Vec<AssetId>")]
pub struct IndexedAssetList {
    assets: Vec<AssetId>,
    positions: BTreeMap<AssetId, usize>,
}

impl IndexedAssetList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `asset` if absent; returns its index either way
    pub fn insert(&mut self, asset: AssetId) -> usize {
        if let Some(&index) = self.positions.get(&asset) {
            return index;
        }
        let index = self.assets.len();
        self.positions.insert(asset.clone(), index);
        self.assets.push(asset);
        index
    }

    /// Swap-remove `asset`.
    ///
    /// With `hint = None` the current index is looked up. With `Some(i)` the
    /// hint must still point at `asset`, otherwise `StaleIndex` is returned
    /// and the list is left untouched. Returns the index that was vacated.
    pub fn remove(&mut self, asset: &AssetId, hint: Option<usize>) -> Result<usize, LedgerError> {
        let index = self.resolve(asset, hint)?;
        self.assets.swap_remove(index);
        self.positions.remove(asset);
        if let Some(moved) = self.assets.get(index) {
            self.positions.insert(moved.clone(), index);
        }
        Ok(index)
    }

    /// Check a hint without mutating
    pub fn check_hint(&self, asset: &AssetId, hint: Option<usize>) -> Result<(), LedgerError> {
        self.resolve(asset, hint).map(|_| ())
    }

    fn resolve(&self, asset: &AssetId, hint: Option<usize>) -> Result<usize, LedgerError> {
        let current = self.positions.get(asset).copied();
        match (hint, current) {
            (None, Some(actual)) => Ok(actual),
            (Some(supplied), Some(actual)) if supplied == actual => Ok(actual),
            (supplied, current) => Err(LedgerError::StaleIndex {
                asset: asset.clone(),
                supplied: supplied.unwrap_or(usize::MAX),
                current,
            }),
        }
    }

    pub fn index_of(&self, asset: &AssetId) -> Option<usize> {
        self.positions.get(asset).copied()
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.positions.contains_key(asset)
    }

    pub fn as_slice(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetId> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl From<Vec<AssetId>> for IndexedAssetList {
    fn from(assets: Vec<AssetId>) -> Self {
        let mut list = Self::new();
        for asset in assets {
            list.insert(asset);
        }
        list
    }
}

impl From<IndexedAssetList> for Vec<AssetId> {
    fn from(list: IndexedAssetList) -> Self {
        list.assets
    }
}
