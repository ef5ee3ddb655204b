// crates/farm-core/src/traits.rs

use crate::error::FarmError;
use crate::identity::{AccountId, AssetId};
use crate::ledger::LedgerOp;
use crate::units::{Amount, BlockNumber};

/// Trait for the fungible-asset ledger the engine moves funds through.
///
/// Implemented by farm-economics (`InMemoryBank`). Any on-chain backend can
/// implement it as long as `apply` is all-or-nothing.
pub trait TokenLedger {
    /// Balance of `account` in `asset`. Unknown pairs are zero.
    fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Amount;

    /// Total units of `asset` in existence.
    fn total_supply(&self, asset: &AssetId) -> Amount;

    /// Apply a batch of movements atomically.
    ///
    /// Either every op is applied in order, or none is and the ledger is left
    /// untouched.
    ///
    /// # Errors
    /// Returns `FarmError::TransferFailure` if any op would overdraw an account.
    fn apply(&mut self, ops: &[LedgerOp]) -> Result<(), FarmError>;
}

/// Parameters published by the emission token.
///
/// Implemented by farm-economics (`EmissionParams`). Percentages are whole
/// numbers in `0..=100`.
pub trait EmissionSource {
    /// First block that earns reward; period 0 starts here.
    fn start_block(&self) -> BlockNumber;

    /// Width of every emission period, in blocks.
    fn block_per_period(&self) -> BlockNumber;

    /// Last period that still emits. Later blocks earn nothing.
    fn maximum_period_index(&self) -> u64;

    /// Reward per block during period 0.
    fn initial_reward_per_block(&self) -> Amount;

    /// Percentage of the previous period's rate kept by the next period.
    fn keep_percent(&self) -> Amount;

    /// Percentage of emission routed to the farming pools.
    fn master_chef_weight(&self) -> Amount;

    /// Percentage of emission routed to the external staking incentive.
    fn incentive_weight(&self) -> Amount;
}
