//! Amount - conversion between asset-native raw amounts and 18-decimal values
//!
//! Token amounts are stored as raw integers in the asset's own decimals
//! (6 for a USDC-like collateral, 18 for krAssets). Valuation always works in
//! `Wad`, so amounts are normalised to 18 decimals before being priced.

use primitive_types::U256;

use crate::error::MathError;
use crate::fixed_point::{to_u128, Rounding, Wad};

/// Largest supported token precision
pub const MAX_DECIMALS: u8 = 36;

/// Normalise a raw amount with `decimals` places into a `Wad`.
///
/// # Example
/// ```
/// use kresko_core::{amount::to_wad, Wad};
///
/// // 1.5 units of a 6-decimal token
/// let value = to_wad(1_500_000, 6).unwrap();
/// assert_eq!(value, "1.5".parse::<Wad>().unwrap());
/// ```
pub fn to_wad(amount: u128, decimals: u8) -> Result<Wad, MathError> {
    if decimals > MAX_DECIMALS {
        return Err(MathError::UnsupportedDecimals(decimals));
    }
    let amount = U256::from(amount);
    let raw = if decimals <= 18 {
        amount
            .checked_mul(U256::exp10(18 - decimals as usize))
            .ok_or(MathError::Overflow)?
    } else {
        amount / U256::exp10(decimals as usize - 18)
    };
    Ok(Wad::from_raw(raw))
}

/// Convert a normalised `Wad` amount back into raw units with `decimals` places.
pub fn from_wad(value: Wad, decimals: u8, rounding: Rounding) -> Result<u128, MathError> {
    if decimals > MAX_DECIMALS {
        return Err(MathError::UnsupportedDecimals(decimals));
    }
    let raw = if decimals <= 18 {
        let divisor = U256::exp10(18 - decimals as usize);
        let quotient = value.raw() / divisor;
        match rounding {
            Rounding::Up if !(value.raw() % divisor).is_zero() => quotient + U256::one(),
            _ => quotient,
        }
    } else {
        value
            .raw()
            .checked_mul(U256::exp10(decimals as usize - 18))
            .ok_or(MathError::Overflow)?
    };
    to_u128(raw)
}

/// Whole units to raw units, e.g. `units(1_000, 18)` is 1000 tokens
pub fn units(whole: u128, decimals: u8) -> Result<u128, MathError> {
    10u128
        .checked_pow(decimals as u32)
        .and_then(|scale| whole.checked_mul(scale))
        .ok_or(MathError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_decimal_collateral() {
        let raw = units(10_000_000, 6).unwrap();
        assert_eq!(to_wad(raw, 6).unwrap(), Wad::from_int(10_000_000).unwrap());
    }

    #[test]
    fn test_eighteen_decimals_is_identity() {
        let raw = 123_456_789_000_000_000_000u128;
        assert_eq!(to_wad(raw, 18).unwrap().raw(), U256::from(raw));
        assert_eq!(from_wad(Wad::from_raw_u128(raw), 18, Rounding::Down).unwrap(), raw);
    }

    #[test]
    fn test_from_wad_rounding() {
        // 1.0000005 units of a 6-decimal token cannot be represented exactly
        let value: Wad = "1.0000005".parse().unwrap();
        assert_eq!(from_wad(value, 6, Rounding::Down).unwrap(), 1_000_000);
        assert_eq!(from_wad(value, 6, Rounding::Up).unwrap(), 1_000_001);
    }

    #[test]
    fn test_high_precision_token() {
        let raw = units(2, 24).unwrap();
        assert_eq!(to_wad(raw, 24).unwrap(), Wad::from_int(2).unwrap());
        assert_eq!(from_wad(Wad::from_int(2).unwrap(), 24, Rounding::Down).unwrap(), raw);
    }

    #[test]
    fn test_unsupported_decimals() {
        assert_eq!(to_wad(1, 40), Err(MathError::UnsupportedDecimals(40)));
    }
}
