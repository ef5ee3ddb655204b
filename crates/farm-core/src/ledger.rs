// crates/farm-core/src/ledger.rs
//
// Token movements requested by the engine. A mutating engine call collects
// every movement it needs into one batch and hands the batch to the
// `TokenLedger`, which applies all of it or none of it.

use serde::{Deserialize, Serialize};

use crate::identity::{AccountId, AssetId};
use crate::units::Amount;

/// A single asset movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    /// Create `amount` new units of `asset` in `to`.
    Mint {
        asset: AssetId,
        to: AccountId,
        amount: Amount,
    },
    /// Destroy `amount` units of `asset` held by `from`.
    Burn {
        asset: AssetId,
        from: AccountId,
        amount: Amount,
    },
    /// Move `amount` units of `asset` from `from` to `to`.
    Transfer {
        asset: AssetId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
}

impl LedgerOp {
    pub fn asset(&self) -> &AssetId {
        match self {
            LedgerOp::Mint { asset, .. }
            | LedgerOp::Burn { asset, .. }
            | LedgerOp::Transfer { asset, .. } => asset,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            LedgerOp::Mint { amount, .. }
            | LedgerOp::Burn { amount, .. }
            | LedgerOp::Transfer { amount, .. } => *amount,
        }
    }
}
