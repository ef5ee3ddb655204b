// crates/farm-economics/src/position.rs
//
// Position ledger: stake and reward debt per (pool, depositor).
//
// pending = amount * acc_reward_per_share / 1e12 - reward_debt + unpaid
//
// After every mutation `reward_debt` is reset to
// `amount * acc_reward_per_share / 1e12`, so a position never earns reward
// accrued before its stake arrived or after it left. Whatever part of the
// pending reward the vault could not cover is kept in `unpaid` and owed on
// the next harvest.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use farm_core::{AccountId, Amount, FarmError, PoolId};

use crate::math::accrued_reward;
use crate::pool::SettledPool;

/// Stake held by one depositor in one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub(crate) amount: Amount,
    pub(crate) reward_debt: Amount,
    #[serde(default)]
    pub(crate) unpaid: Amount,
}

impl Position {
    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn reward_debt(&self) -> Amount {
        self.reward_debt
    }

    /// Reward owed earlier but not yet paid out.
    pub fn unpaid(&self) -> Amount {
        self.unpaid
    }

    /// Reward owed at accumulator value `acc_reward_per_share`.
    pub fn pending(&self, acc_reward_per_share: Amount) -> Result<Amount, FarmError> {
        let accrued = accrued_reward(self.amount, acc_reward_per_share)?;
        accrued
            .saturating_sub(self.reward_debt)
            .checked_add(self.unpaid)
            .ok_or(FarmError::ArithmeticOverflow("pending reward"))
    }
}

/// A position staged against a settled pool, waiting to be committed.
#[derive(Debug)]
pub struct StagedPosition {
    pool: PoolId,
    depositor: AccountId,
    position: Position,
    pending: Amount,
}

impl StagedPosition {
    /// Reward owed to the depositor as of the settle this position was staged on.
    pub fn pending(&self) -> Amount {
        self.pending
    }

    pub fn amount(&self) -> Amount {
        self.position.amount
    }

    pub(crate) fn add(&mut self, settled: &mut SettledPool, amount: Amount) -> Result<(), FarmError> {
        self.position.amount = self
            .position
            .amount
            .checked_add(amount)
            .ok_or(FarmError::ArithmeticOverflow("position amount"))?;
        settled.add_stake(amount)
    }

    /// # Errors
    /// Returns `FarmError::InsufficientStake` when `amount` exceeds the stake.
    pub(crate) fn remove(&mut self, settled: &mut SettledPool, amount: Amount) -> Result<(), FarmError> {
        if amount > self.position.amount {
            return Err(FarmError::InsufficientStake {
                pool: self.pool,
                requested: amount,
                held: self.position.amount,
            });
        }
        self.position.amount -= amount;
        settled.remove_stake(amount);
        Ok(())
    }

    /// Drop the whole stake and forgo the pending reward. Returns the stake.
    pub(crate) fn clear(&mut self, settled: &mut SettledPool) -> Amount {
        let amount = self.position.amount;
        self.position.amount = 0;
        self.position.unpaid = 0;
        self.pending = 0;
        settled.remove_stake(amount);
        amount
    }

    /// Record that `paid` of the pending reward went out; the rest stays owed.
    pub(crate) fn record_payout(&mut self, paid: Amount) {
        self.position.unpaid = self.pending.saturating_sub(paid);
    }

    /// Reset the reward debt against the settled accumulator.
    pub(crate) fn finish(mut self, settled: &SettledPool) -> Result<StagedPosition, FarmError> {
        self.position.reward_debt =
            accrued_reward(self.position.amount, settled.acc_reward_per_share())?;
        Ok(self)
    }
}

/// All positions, keyed by (pool, depositor).
#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    positions: HashMap<(PoolId, AccountId), Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The position of `depositor` in `pool`; zero if they never touched it.
    pub fn position(&self, pool: PoolId, depositor: &AccountId) -> Position {
        self.positions
            .get(&(pool, *depositor))
            .copied()
            .unwrap_or_default()
    }

    /// Whether `depositor` has ever touched `pool`.
    pub fn contains(&self, pool: PoolId, depositor: &AccountId) -> bool {
        self.positions.contains_key(&(pool, *depositor))
    }

    /// Number of depositors that have ever touched `pool`.
    pub fn depositors_in(&self, pool: PoolId) -> usize {
        self.positions.keys().filter(|(p, _)| *p == pool).count()
    }

    /// Stage `depositor`'s position against a settled pool.
    ///
    /// The pending reward is fixed here, before any stake change.
    pub fn stage(
        &self,
        settled: &SettledPool,
        depositor: &AccountId,
    ) -> Result<StagedPosition, FarmError> {
        let position = self.position(settled.id(), depositor);
        let pending = position.pending(settled.acc_reward_per_share())?;
        Ok(StagedPosition {
            pool: settled.id(),
            depositor: *depositor,
            position,
            pending,
        })
    }

    pub(crate) fn commit(&mut self, staged: StagedPosition) {
        self.positions
            .insert((staged.pool, staged.depositor), staged.position);
    }
}
