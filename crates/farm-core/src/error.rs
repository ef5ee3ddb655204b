// crates/farm-core/src/error.rs
//
// Error type for the farming engine.

use thiserror::Error;

use crate::units::{Amount, PoolId};

/// Error type shared by every crate of the farming engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FarmError {
    /// A withdrawal asked for more than the position holds.
    #[error("Insufficient stake in pool {pool}: requested {requested} but only {held} staked")]
    InsufficientStake {
        pool: PoolId,
        requested: Amount,
        held: Amount,
    },

    /// Unknown pool id, or a pool that cannot be used through this entry point.
    #[error("Invalid pool {pool}: {reason}")]
    InvalidPool { pool: PoolId, reason: String },

    /// The token ledger refused to move funds. The whole call is rolled back.
    #[error("Transfer failure: {0}")]
    TransferFailure(String),

    /// A checked multiply, add or divide would have wrapped.
    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// Emission or engine parameters that cannot produce a sane schedule.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FarmError {
    /// Shorthand for an unknown pool id.
    pub fn unknown_pool(pool: PoolId) -> Self {
        FarmError::InvalidPool {
            pool,
            reason: "no such pool".to_string(),
        }
    }
}

impl From<serde_json::Error> for FarmError {
    fn from(e: serde_json::Error) -> Self {
        FarmError::Serialization(e.to_string())
    }
}
