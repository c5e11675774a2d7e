//! Risk engine errors

use kresko_core::MathError;
use kresko_oracle::OracleError;
use kresko_registry::RegistryError;
use kresko_token::TokenError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}
