//! Rebase transform between internal (principal) and observed balances
//!
//! Balances are always stored in internal units. The observed balance is
//! `internal * denominator` for a positive rebase and `internal / denominator`
//! for a negative one. `RebaseInfo` is absolute: a new rebase replaces the
//! previous one, and `RebaseInfo::default()` (denominator 1) is the identity.

use kresko_core::{Rounding, Wad};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseInfo {
    pub denominator: Wad,
    pub positive: bool,
}

impl Default for RebaseInfo {
    fn default() -> Self {
        Self {
            denominator: Wad::ONE,
            positive: false,
        }
    }
}

impl RebaseInfo {
    /// Validated constructor; the denominator must be at least 1
    pub fn new(denominator: Wad, positive: bool) -> Result<Self, TokenError> {
        if denominator < Wad::ONE {
            return Err(TokenError::InvalidDenominator(denominator));
        }
        Ok(Self {
            denominator,
            positive,
        })
    }

    pub fn is_rebased(&self) -> bool {
        self.denominator != Wad::ONE
    }

    /// Internal units to observed units
    pub fn to_observed(&self, internal: u128, rounding: Rounding) -> Result<u128, TokenError> {
        if !self.is_rebased() {
            return Ok(internal);
        }
        let observed = if self.positive {
            self.denominator.mul_amount(internal, rounding)?
        } else {
            self.denominator.div_amount(internal, rounding)?
        };
        Ok(observed)
    }

    /// Observed units to internal units
    pub fn to_internal(&self, observed: u128, rounding: Rounding) -> Result<u128, TokenError> {
        if !self.is_rebased() {
            return Ok(observed);
        }
        let internal = if self.positive {
            self.denominator.div_amount(observed, rounding)?
        } else {
            self.denominator.mul_amount(observed, rounding)?
        };
        Ok(internal)
    }
}

/// Read access to per-asset rebase state
pub trait RebaseLookup {
    /// Rebase of `asset`; identity for assets without one
    fn rebase_info(&self, asset: &kresko_core::AssetId) -> RebaseInfo;
}
