//! Token book - every listed krAsset with its anchor

use kresko_core::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::anchor::KreskoAssetAnchor;
use crate::error::TokenError;
use crate::krasset::KreskoAsset;
use crate::rebase::{RebaseInfo, RebaseLookup};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBook {
    tokens: BTreeMap<AssetId, KreskoAsset>,
    anchors: BTreeMap<AssetId, KreskoAssetAnchor>,
}

impl TokenBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the rebasing token and its anchor
    pub fn create(&mut self, asset: &AssetId) -> Result<(), TokenError> {
        if self.tokens.contains_key(asset) {
            return Err(TokenError::TokenExists(asset.clone()));
        }
        self.tokens.insert(asset.clone(), KreskoAsset::new(asset.clone()));
        self.anchors
            .insert(asset.clone(), KreskoAssetAnchor::new(asset.clone()));
        Ok(())
    }

    pub fn token(&self, asset: &AssetId) -> Result<&KreskoAsset, TokenError> {
        self.tokens
            .get(asset)
            .ok_or_else(|| TokenError::UnknownToken(asset.clone()))
    }

    pub fn token_mut(&mut self, asset: &AssetId) -> Result<&mut KreskoAsset, TokenError> {
        self.tokens
            .get_mut(asset)
            .ok_or_else(|| TokenError::UnknownToken(asset.clone()))
    }

    pub fn anchor(&self, asset: &AssetId) -> Result<&KreskoAssetAnchor, TokenError> {
        self.anchors
            .get(asset)
            .ok_or_else(|| TokenError::UnknownToken(asset.clone()))
    }

    /// Token and anchor together, for wrap/unwrap
    pub fn pair_mut(
        &mut self,
        asset: &AssetId,
    ) -> Result<(&mut KreskoAsset, &mut KreskoAssetAnchor), TokenError> {
        let token = self
            .tokens
            .get_mut(asset)
            .ok_or_else(|| TokenError::UnknownToken(asset.clone()))?;
        let anchor = self
            .anchors
            .get_mut(asset)
            .ok_or_else(|| TokenError::UnknownToken(asset.clone()))?;
        Ok((token, anchor))
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.tokens.keys()
    }
}

impl RebaseLookup for TokenBook {
    fn rebase_info(&self, asset: &AssetId) -> RebaseInfo {
        self.tokens
            .get(asset)
            .map(|t| t.rebase_info())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kresko_core::{AccountId, Wad};

    #[test]
    fn test_create_and_lookup() {
        let mut book = TokenBook::new();
        let tsla = AssetId::from("krTSLA");
        book.create(&tsla).unwrap();

        assert!(matches!(book.create(&tsla), Err(TokenError::TokenExists(_))));
        assert_eq!(book.token(&tsla).unwrap().id(), &tsla);
        assert_eq!(book.anchor(&tsla).unwrap().underlying(), &tsla);
        assert!(book.token(&"krETH".into()).is_err());
    }

    #[test]
    fn test_rebase_lookup_defaults_to_identity() {
        let mut book = TokenBook::new();
        let tsla = AssetId::from("krTSLA");
        book.create(&tsla).unwrap();
        let split = RebaseInfo::new(Wad::from_int(2).unwrap(), true).unwrap();
        book.token_mut(&tsla).unwrap().rebase(split).unwrap();

        assert_eq!(book.rebase_info(&tsla), split);
        assert_eq!(book.rebase_info(&"USDC".into()), RebaseInfo::default());
    }

    #[test]
    fn test_pair_mut_wraps() {
        let mut book = TokenBook::new();
        let tsla = AssetId::from("krTSLA");
        let alice = AccountId::from("alice");
        book.create(&tsla).unwrap();
        book.token_mut(&tsla).unwrap().mint(&alice, 50).unwrap();

        let (token, anchor) = book.pair_mut(&tsla).unwrap();
        anchor.wrap(token, &alice, 20).unwrap();
        assert_eq!(book.anchor(&tsla).unwrap().balance_of(&alice), 20);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut book = TokenBook::new();
        let tsla = AssetId::from("krTSLA");
        book.create(&tsla).unwrap();
        book.token_mut(&tsla).unwrap().mint(&"alice".into(), 5).unwrap();

        let json = serde_json::to_string(&book).unwrap();
        let parsed: TokenBook = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, book);
    }
}
