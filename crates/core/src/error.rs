//! Arithmetic errors

use thiserror::Error;

/// Errors raised by fixed-point and amount arithmetic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Value cannot be negative: {0}")]
    Negative(String),

    #[error("Invalid fixed-point literal: {0}")]
    Parse(String),

    #[error("{value} has more than {decimals} decimal places")]
    TooPrecise { value: String, decimals: usize },

    #[error("Unsupported token decimals: {0}")]
    UnsupportedDecimals(u8),
}
