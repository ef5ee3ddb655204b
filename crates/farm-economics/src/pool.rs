// crates/farm-economics/src/pool.rs
//
// Pool registry: the ordered set of farming pools and their reward
// accumulators.
//
// Settling a pool brings its `acc_reward_per_share` up to the current block:
//   pool_reward = master_chef_reward(last_reward_block, now)
//                 * alloc_point / total_alloc_point
//   acc_reward_per_share += pool_reward * 1e12 / total_staked
//
// `settle` never mutates the registry. It returns a `SettledPool` staging
// value; positions can only be changed through that value, and the registry
// only accepts the change back through `commit`. This keeps every stake
// mutation behind a completed settle.

use serde::{Deserialize, Serialize};

use farm_core::{Amount, AssetId, BlockNumber, FarmError, PoolId};

use crate::emission::EmissionSchedule;
use crate::math::{mul_div, reward_per_share};

/// A single farming pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub(crate) stake_asset: AssetId,
    pub(crate) alloc_point: Amount,
    pub(crate) last_reward_block: BlockNumber,
    pub(crate) acc_reward_per_share: Amount,
    pub(crate) total_staked: Amount,
}

impl Pool {
    /// Asset depositors stake into this pool.
    pub fn stake_asset(&self) -> &AssetId {
        &self.stake_asset
    }

    /// Allocation weight of this pool.
    pub fn alloc_point(&self) -> Amount {
        self.alloc_point
    }

    /// Last block whose reward is already folded into the accumulator.
    pub fn last_reward_block(&self) -> BlockNumber {
        self.last_reward_block
    }

    /// Accumulated reward per staked unit, scaled by `ACC_REWARD_PRECISION`.
    pub fn acc_reward_per_share(&self) -> Amount {
        self.acc_reward_per_share
    }

    /// Sum of all position amounts in this pool.
    pub fn total_staked(&self) -> Amount {
        self.total_staked
    }
}

/// A pool brought up to date at some block, not yet written back.
#[derive(Debug, Clone)]
pub struct SettledPool {
    id: PoolId,
    pool: Pool,
    minted: Amount,
}

impl SettledPool {
    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Reward newly accrued by this settle; minted to the staking vault on commit.
    pub fn minted(&self) -> Amount {
        self.minted
    }

    pub fn acc_reward_per_share(&self) -> Amount {
        self.pool.acc_reward_per_share
    }

    pub(crate) fn add_stake(&mut self, amount: Amount) -> Result<(), FarmError> {
        self.pool.total_staked = self
            .pool
            .total_staked
            .checked_add(amount)
            .ok_or(FarmError::ArithmeticOverflow("pool total stake"))?;
        Ok(())
    }

    pub(crate) fn remove_stake(&mut self, amount: Amount) {
        // A position never holds more than the pool total.
        self.pool.total_staked = self.pool.total_staked.saturating_sub(amount);
    }
}

/// Ordered collection of pools plus the aggregate allocation weight.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolRegistry {
    pools: Vec<Pool>,
    total_alloc_point: Amount,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn total_alloc_point(&self) -> Amount {
        self.total_alloc_point
    }

    /// Look up a pool.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidPool` if `id` is out of range.
    pub fn get(&self, id: PoolId) -> Result<&Pool, FarmError> {
        self.pools.get(id).ok_or_else(|| FarmError::unknown_pool(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolId, &Pool)> {
        self.pools.iter().enumerate()
    }

    /// Append a pool that starts accruing at `first_block`.
    pub(crate) fn push(
        &mut self,
        stake_asset: AssetId,
        alloc_point: Amount,
        first_block: BlockNumber,
    ) -> Result<PoolId, FarmError> {
        self.total_alloc_point = self
            .total_alloc_point
            .checked_add(alloc_point)
            .ok_or(FarmError::ArithmeticOverflow("total alloc point"))?;
        self.pools.push(Pool {
            stake_asset,
            alloc_point,
            last_reward_block: first_block,
            acc_reward_per_share: 0,
            total_staked: 0,
        });
        Ok(self.pools.len() - 1)
    }

    /// Replace a pool's weight, returning the previous weight.
    pub(crate) fn set_alloc_point(
        &mut self,
        id: PoolId,
        alloc_point: Amount,
    ) -> Result<Amount, FarmError> {
        let previous = self.get(id)?.alloc_point;
        let total = (self.total_alloc_point - previous)
            .checked_add(alloc_point)
            .ok_or(FarmError::ArithmeticOverflow("total alloc point"))?;
        self.total_alloc_point = total;
        self.pools[id].alloc_point = alloc_point;
        Ok(previous)
    }

    /// Bring pool `id` up to `current_block` without touching the registry.
    ///
    /// - `current_block <= last_reward_block`: nothing changes.
    /// - Empty pool: only `last_reward_block` advances; the reward for that
    ///   span is not credited to anyone.
    /// - Otherwise the pool's share of the emission is folded into
    ///   `acc_reward_per_share`.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidPool` for an unknown id and
    /// `FarmError::ArithmeticOverflow` if the accumulator math overflows.
    pub fn settle(
        &self,
        id: PoolId,
        current_block: BlockNumber,
        schedule: &EmissionSchedule,
    ) -> Result<SettledPool, FarmError> {
        let mut pool = self.get(id)?.clone();
        let mut minted = 0;

        if current_block > pool.last_reward_block {
            if pool.total_staked > 0 {
                minted = self.pool_reward(&pool, current_block, schedule)?;
                let increment = reward_per_share(minted, pool.total_staked)?;
                pool.acc_reward_per_share = pool
                    .acc_reward_per_share
                    .checked_add(increment)
                    .ok_or(FarmError::ArithmeticOverflow("acc reward per share"))?;
            }
            pool.last_reward_block = current_block;
        }

        Ok(SettledPool { id, pool, minted })
    }

    /// Write a settled (and possibly re-staked) pool back.
    pub(crate) fn commit(&mut self, settled: SettledPool) {
        let SettledPool { id, pool, minted } = settled;
        tracing::debug!(
            pool = id,
            last_reward_block = pool.last_reward_block,
            acc_reward_per_share = %pool.acc_reward_per_share,
            total_staked = %pool.total_staked,
            minted = %minted,
            "Pool settled"
        );
        self.pools[id] = pool;
    }

    fn pool_reward(
        &self,
        pool: &Pool,
        current_block: BlockNumber,
        schedule: &EmissionSchedule,
    ) -> Result<Amount, FarmError> {
        if self.total_alloc_point == 0 || pool.alloc_point == 0 {
            return Ok(0);
        }
        let reward = schedule.master_chef_reward(pool.last_reward_block, current_block)?;
        mul_div(
            reward,
            pool.alloc_point,
            self.total_alloc_point,
            "pool reward share",
        )
    }
}
