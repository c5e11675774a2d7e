//! Identifiers - assets and accounts
//!
//! Both are opaque strings (a ticker, a contract address, a user handle).
//! Parsing validates user input; a few reserved account ids are only
//! reachable through constructors so they can never collide with users.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum identifier length (long enough for hex addresses)
pub const MAX_ID_LEN: usize = 64;

/// Errors that can occur when parsing identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Empty identifier")]
    Empty,

    #[error("Identifier too long (max {MAX_ID_LEN} chars): {0}")]
    TooLong(String),

    #[error("Invalid identifier format: {0}")]
    InvalidFormat(String),
}

fn validate(s: &str) -> Result<String, IdError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    if s.len() > MAX_ID_LEN {
        return Err(IdError::TooLong(s.to_string()));
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(IdError::InvalidFormat(s.to_string()));
    }
    Ok(s.to_string())
}

/// Asset identifier (collateral token or krAsset)
///
/// # Examples
/// ```
/// use kresko_core::AssetId;
///
/// let usdc: AssetId = "USDC".parse().unwrap();
/// assert_eq!(usdc.as_str(), "USDC");
/// assert!("bad asset".parse::<AssetId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssetId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s).map(AssetId)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| AssetId(s.trim().to_string()))
    }
}

/// Account identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Protocol custody account (holds krAssets deposited as collateral)
    pub fn protocol() -> Self {
        AccountId("@protocol".to_string())
    }

    /// Custody account of the anchor wrapping `asset`
    pub fn anchor(asset: &AssetId) -> Self {
        AccountId(format!("@anchor:{}", asset))
    }

    /// True for accounts created through the reserved constructors
    pub fn is_reserved(&self) -> bool {
        self.0.starts_with('@')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s).map(AccountId)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| AccountId(s.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asset() {
        let asset: AssetId = " krETH ".parse().unwrap();
        assert_eq!(asset.to_string(), "krETH");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<AssetId>(), Err(IdError::Empty));
        assert!(matches!("a b".parse::<AccountId>(), Err(IdError::InvalidFormat(_))));
        assert!(matches!(
            "x".repeat(MAX_ID_LEN + 1).parse::<AccountId>(),
            Err(IdError::TooLong(_))
        ));
    }

    #[test]
    fn test_reserved_accounts_cannot_be_parsed() {
        assert!("@protocol".parse::<AccountId>().is_err());
        assert!(AccountId::protocol().is_reserved());
        assert!(AccountId::anchor(&AssetId::from("krTSLA")).is_reserved());
        assert!(!AccountId::from("alice").is_reserved());
    }

    #[test]
    fn test_serde_transparent() {
        let account = AccountId::from("0xabc123");
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, "\"0xabc123\"");
        let parsed: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, account);
    }
}
