// crates/farm-core/src/lib.rs
//
// farm-core: identifiers, error type, and collaborator traits for the
// farming reward engine.
//
// This is the leaf crate the rest of the workspace depends on. The token
// ledger and the emission token are external collaborators; they are only
// described here as traits so the engine can be driven by any backend.

pub mod error;
pub mod identity;
pub mod ledger;
pub mod traits;
pub mod units;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use farm_core::AccountId;`

pub use error::FarmError;
pub use identity::{AccountId, AssetId};
pub use ledger::LedgerOp;
pub use traits::{EmissionSource, TokenLedger};
pub use units::{Amount, BlockNumber, PoolId};
