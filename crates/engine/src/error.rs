//! The module contains the errors the engine can return.
//!
//! Lookups of ownable rows that belong to another user surface as
//! [`KeyNotFound`], so callers cannot tell foreign ids from missing ones.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidSettings(a), Self::InvalidSettings(b)) => a == b,
            (Self::InvalidFilter(a), Self::InvalidFilter(b)) => a == b,
            (Self::UnsupportedCurrency(a), Self::UnsupportedCurrency(b)) => a == b,
            (Self::InvalidCredentials(a), Self::InvalidCredentials(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::PasswordHash(a), Self::PasswordHash(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
