//! Fixed-point values - scaled 256-bit integers
//!
//! `Wad` is an 18-decimal fixed-point number (raw value / 10^18) used for
//! prices, USD values, ratios, factors and normalised token amounts.
//! `Ray` is a 27-decimal fixed-point number used for debt-index math.
//!
//! Every multiplication and division takes an explicit [`Rounding`]. The rule
//! used throughout the protocol: round down what the protocol owes a user,
//! round up what a user owes the protocol.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MathError;

/// 10^18
pub const WAD_SCALE: u128 = 1_000_000_000_000_000_000;

/// 10^27
pub const RAY_SCALE: u128 = 1_000_000_000_000_000_000_000_000_000;

/// 10^9, converts between `Wad` and `Ray`
pub const WAD_RAY_RATIO: u128 = 1_000_000_000;

const WAD_DECIMALS: usize = 18;
const RAY_DECIMALS: usize = 27;

/// Rounding direction for a single operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rounding {
    /// Truncate toward zero
    Down,
    /// Round away from zero when there is a remainder
    Up,
}

/// `a * b / denominator` with the requested rounding.
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(MathError::Overflow)?;
    let quotient = product / denominator;
    match rounding {
        Rounding::Up if !(product % denominator).is_zero() => {
            quotient.checked_add(U256::one()).ok_or(MathError::Overflow)
        }
        _ => Ok(quotient),
    }
}

/// Narrow a 256-bit value to `u128`.
pub fn to_u128(value: U256) -> Result<u128, MathError> {
    if value > U256::from(u128::MAX) {
        Err(MathError::Overflow)
    } else {
        Ok(value.low_u128())
    }
}

/// An 18-decimal fixed-point value.
///
/// # Example
/// ```
/// use kresko_core::{Rounding, Wad};
///
/// let price: Wad = "1000".parse().unwrap();
/// let factor: Wad = "0.5".parse().unwrap();
/// assert_eq!(price.mul(factor, Rounding::Down).unwrap().to_string(), "500");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Wad(U256);

impl Wad {
    pub const ZERO: Self = Self(U256([0, 0, 0, 0]));
    pub const ONE: Self = Self(U256([WAD_SCALE as u64, 0, 0, 0]));

    #[inline]
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Raw value scaled by 10^18
    #[inline]
    pub const fn raw(&self) -> U256 {
        self.0
    }

    /// Build from a raw `u128` already scaled by 10^18
    pub fn from_raw_u128(raw: u128) -> Self {
        Self(U256::from(raw))
    }

    /// Build from a whole number, e.g. `from_int(3)` is `3.0`
    pub fn from_int(value: u128) -> Result<Self, MathError> {
        U256::from(value)
            .checked_mul(U256::from(WAD_SCALE))
            .map(Self)
            .ok_or(MathError::Overflow)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: Wad) -> Result<Wad, MathError> {
        self.0.checked_add(other.0).map(Wad).ok_or(MathError::Overflow)
    }

    pub fn checked_sub(&self, other: Wad) -> Result<Wad, MathError> {
        self.0.checked_sub(other.0).map(Wad).ok_or(MathError::Underflow)
    }

    pub fn saturating_sub(&self, other: Wad) -> Wad {
        Wad(self.0.saturating_sub(other.0))
    }

    /// `self * other` in fixed point
    pub fn mul(&self, other: Wad, rounding: Rounding) -> Result<Wad, MathError> {
        mul_div(self.0, other.0, U256::from(WAD_SCALE), rounding).map(Wad)
    }

    /// `self / other` in fixed point
    pub fn div(&self, other: Wad, rounding: Rounding) -> Result<Wad, MathError> {
        mul_div(self.0, U256::from(WAD_SCALE), other.0, rounding).map(Wad)
    }

    pub fn mul_down(&self, other: Wad) -> Result<Wad, MathError> {
        self.mul(other, Rounding::Down)
    }

    pub fn mul_up(&self, other: Wad) -> Result<Wad, MathError> {
        self.mul(other, Rounding::Up)
    }

    pub fn div_down(&self, other: Wad) -> Result<Wad, MathError> {
        self.div(other, Rounding::Down)
    }

    pub fn div_up(&self, other: Wad) -> Result<Wad, MathError> {
        self.div(other, Rounding::Up)
    }

    /// Integer power, each step rounded down
    pub fn pow(&self, exponent: u32) -> Result<Wad, MathError> {
        let mut result = Wad::ONE;
        for _ in 0..exponent {
            result = result.mul_down(*self)?;
        }
        Ok(result)
    }

    /// Scale a token amount (any unit) by this value: `amount * self`
    pub fn mul_amount(&self, amount: u128, rounding: Rounding) -> Result<u128, MathError> {
        to_u128(mul_div(U256::from(amount), self.0, U256::from(WAD_SCALE), rounding)?)
    }

    /// Divide a token amount (any unit) by this value: `amount / self`
    pub fn div_amount(&self, amount: u128, rounding: Rounding) -> Result<u128, MathError> {
        to_u128(mul_div(U256::from(amount), U256::from(WAD_SCALE), self.0, rounding)?)
    }

    /// Lossless widening to ray precision
    pub fn to_ray(&self) -> Result<Ray, MathError> {
        self.0
            .checked_mul(U256::from(WAD_RAY_RATIO))
            .map(Ray)
            .ok_or(MathError::Overflow)
    }

    pub fn min(self, other: Wad) -> Wad {
        if self <= other {
            self
        } else {
            other
        }
    }

    pub fn max(self, other: Wad) -> Wad {
        if self >= other {
            self
        } else {
            other
        }
    }

    /// Convert to a `rust_decimal::Decimal` for display and CLI output
    pub fn to_decimal(&self) -> Result<rust_decimal::Decimal, MathError> {
        rust_decimal::Decimal::from_str(&self.to_string())
            .map(|d| d.normalize())
            .map_err(|_| MathError::Overflow)
    }
}

impl TryFrom<rust_decimal::Decimal> for Wad {
    type Error = MathError;

    fn try_from(value: rust_decimal::Decimal) -> Result<Self, Self::Error> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MathError::Negative(value.to_string()));
        }
        let scale = value.scale() as usize;
        let mantissa = U256::from(value.mantissa().unsigned_abs());
        let raw = if scale <= WAD_DECIMALS {
            mantissa
                .checked_mul(U256::exp10(WAD_DECIMALS - scale))
                .ok_or(MathError::Overflow)?
        } else {
            mantissa / U256::exp10(scale - WAD_DECIMALS)
        };
        Ok(Wad(raw))
    }
}

impl fmt::Display for Wad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fixed(f, self.0, WAD_DECIMALS)
    }
}

impl FromStr for Wad {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, WAD_DECIMALS).map(Wad)
    }
}

impl TryFrom<String> for Wad {
    type Error = MathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Wad> for String {
    fn from(value: Wad) -> Self {
        value.to_string()
    }
}

/// A 27-decimal fixed-point value used for debt indexes and rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ray(U256);

impl Ray {
    pub const ZERO: Self = Self(U256([0, 0, 0, 0]));
    // 10^27 split into little-endian 64-bit words
    pub const ONE: Self = Self(U256([11_515_845_246_265_065_472, 54_210_108, 0, 0]));

    #[inline]
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> U256 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: Ray) -> Result<Ray, MathError> {
        self.0.checked_add(other.0).map(Ray).ok_or(MathError::Overflow)
    }

    pub fn checked_sub(&self, other: Ray) -> Result<Ray, MathError> {
        self.0.checked_sub(other.0).map(Ray).ok_or(MathError::Underflow)
    }

    pub fn mul(&self, other: Ray, rounding: Rounding) -> Result<Ray, MathError> {
        mul_div(self.0, other.0, U256::from(RAY_SCALE), rounding).map(Ray)
    }

    pub fn div(&self, other: Ray, rounding: Rounding) -> Result<Ray, MathError> {
        mul_div(self.0, U256::from(RAY_SCALE), other.0, rounding).map(Ray)
    }

    /// Multiply by a plain integer (e.g. elapsed seconds)
    pub fn mul_int(&self, value: u64) -> Result<Ray, MathError> {
        self.0
            .checked_mul(U256::from(value))
            .map(Ray)
            .ok_or(MathError::Overflow)
    }

    /// Divide by a plain integer, rounding down
    pub fn div_int(&self, value: u64) -> Result<Ray, MathError> {
        if value == 0 {
            return Err(MathError::DivisionByZero);
        }
        Ok(Ray(self.0 / U256::from(value)))
    }

    /// `amount * self` for a token amount
    pub fn mul_amount(&self, amount: u128, rounding: Rounding) -> Result<u128, MathError> {
        to_u128(mul_div(U256::from(amount), self.0, U256::from(RAY_SCALE), rounding)?)
    }

    /// `amount / self` for a token amount
    pub fn div_amount(&self, amount: u128, rounding: Rounding) -> Result<u128, MathError> {
        to_u128(mul_div(U256::from(amount), U256::from(RAY_SCALE), self.0, rounding)?)
    }

    pub fn to_wad(&self, rounding: Rounding) -> Result<Wad, MathError> {
        mul_div(self.0, U256::one(), U256::from(WAD_RAY_RATIO), rounding).map(Wad)
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fixed(f, self.0, RAY_DECIMALS)
    }
}

impl FromStr for Ray {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, RAY_DECIMALS).map(Ray)
    }
}

impl TryFrom<String> for Ray {
    type Error = MathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Ray> for String {
    fn from(value: Ray) -> Self {
        value.to_string()
    }
}

fn write_fixed(f: &mut fmt::Formatter<'_>, raw: U256, decimals: usize) -> fmt::Result {
    let scale = U256::exp10(decimals);
    let whole = raw / scale;
    let frac = raw % scale;
    if frac.is_zero() {
        return write!(f, "{}", whole);
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals);
    write!(f, "{}.{}", whole, frac.trim_end_matches('0'))
}

fn parse_fixed(s: &str, decimals: usize) -> Result<U256, MathError> {
    let s = s.trim().replace('_', "");
    if s.is_empty() {
        return Err(MathError::Parse(s));
    }
    if s.starts_with('-') {
        return Err(MathError::Negative(s));
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s.as_str(), ""),
    };
    let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
        return Err(MathError::Parse(s.clone()));
    }
    if frac.len() > decimals {
        return Err(MathError::TooPrecise {
            value: s.clone(),
            decimals,
        });
    }

    let parse = |part: &str| -> Result<U256, MathError> {
        if part.is_empty() {
            Ok(U256::zero())
        } else {
            U256::from_dec_str(part).map_err(|_| MathError::Parse(part.to_string()))
        }
    };

    let whole = parse(whole)?
        .checked_mul(U256::exp10(decimals))
        .ok_or(MathError::Overflow)?;
    let frac = parse(frac)?
        .checked_mul(U256::exp10(decimals - frac.len()))
        .ok_or(MathError::Overflow)?;
    whole.checked_add(frac).ok_or(MathError::Overflow)
}
