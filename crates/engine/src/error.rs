//! The module contains the errors the engine can throw.
//!
//! Allocation and aggregation are pure, so their errors are local and
//! deterministic; only [`Database`] wraps an I/O failure.
//!
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid participants: {0}")]
    InvalidParticipants(String),
    #[error("Invalid percentage: {0}")]
    InvalidPercentage(String),
    #[error("allocated shares sum to {actual}, expense total is {expected}")]
    AmountMismatch { expected: i64, actual: i64 },
    #[error("debts not found: {0:?}")]
    MissingDebts(Vec<Uuid>),
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidParticipants(a), Self::InvalidParticipants(b)) => a == b,
            (Self::InvalidPercentage(a), Self::InvalidPercentage(b)) => a == b,
            (
                Self::AmountMismatch {
                    expected: a,
                    actual: b,
                },
                Self::AmountMismatch {
                    expected: c,
                    actual: d,
                },
            ) => a == c && b == d,
            (Self::MissingDebts(a), Self::MissingDebts(b)) => a == b,
            (Self::ConcurrentModification(a), Self::ConcurrentModification(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
