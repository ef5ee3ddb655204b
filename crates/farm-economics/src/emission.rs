// crates/farm-economics/src/emission.rs
//
// Period-based emission schedule with geometric decay.
//
// Emission is divided into fixed-width periods starting at `start_block`:
// - Period 0 emits `initial_reward_per_block` per block.
// - Each later period keeps `keep_percent`% of the previous period's rate,
//   truncated at every step.
// - Periods after `maximum_period_index` emit nothing.
//
// Only `master_chef_weight`% of the emission is accrued by the farming pools.
// The `incentive_weight`% share belongs to the external staking incentive and
// is never minted here.

use serde::{Deserialize, Serialize};

use farm_core::{Amount, BlockNumber, EmissionSource, FarmError};

use crate::math::mul_div;

/// Emission parameters as published by the emission token.
///
/// Deserializable from the `[emission]` table of a TOML config. Missing
/// fields fall back to the devnet defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionParams {
    /// First block that earns reward.
    #[serde(default)]
    pub start_block: BlockNumber,

    /// Width of one emission period, in blocks.
    #[serde(default = "default_block_per_period")]
    pub block_per_period: BlockNumber,

    /// Index of the last emitting period.
    #[serde(default = "default_maximum_period_index")]
    pub maximum_period_index: u64,

    /// Reward per block during period 0.
    #[serde(default = "default_initial_reward_per_block")]
    pub initial_reward_per_block: Amount,

    /// Percentage of the rate carried from one period to the next.
    #[serde(default = "default_keep_percent")]
    pub keep_percent: Amount,

    /// Percentage of emission accrued by the farming pools.
    #[serde(default = "default_master_chef_weight")]
    pub master_chef_weight: Amount,

    /// Percentage of emission routed to the staking incentive.
    #[serde(default = "default_incentive_weight")]
    pub incentive_weight: Amount,
}

fn default_block_per_period() -> BlockNumber {
    20
}

fn default_maximum_period_index() -> u64 {
    2
}

fn default_initial_reward_per_block() -> Amount {
    1_000
}

fn default_keep_percent() -> Amount {
    50
}

fn default_master_chef_weight() -> Amount {
    50
}

fn default_incentive_weight() -> Amount {
    50
}

impl Default for EmissionParams {
    fn default() -> Self {
        Self {
            start_block: 0,
            block_per_period: default_block_per_period(),
            maximum_period_index: default_maximum_period_index(),
            initial_reward_per_block: default_initial_reward_per_block(),
            keep_percent: default_keep_percent(),
            master_chef_weight: default_master_chef_weight(),
            incentive_weight: default_incentive_weight(),
        }
    }
}

impl EmissionParams {
    /// Check that the parameters describe a usable schedule.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidConfig` if a period is zero blocks wide, a
    /// percentage exceeds 100, the two weights together exceed 100, or the
    /// initial rate is too large for the per-period decay multiply.
    pub fn validate(&self) -> Result<(), FarmError> {
        validate_source(self)
    }
}

impl EmissionSource for EmissionParams {
    fn start_block(&self) -> BlockNumber {
        self.start_block
    }

    fn block_per_period(&self) -> BlockNumber {
        self.block_per_period
    }

    fn maximum_period_index(&self) -> u64 {
        self.maximum_period_index
    }

    fn initial_reward_per_block(&self) -> Amount {
        self.initial_reward_per_block
    }

    fn keep_percent(&self) -> Amount {
        self.keep_percent
    }

    fn master_chef_weight(&self) -> Amount {
        self.master_chef_weight
    }

    fn incentive_weight(&self) -> Amount {
        self.incentive_weight
    }
}

fn validate_source<S: EmissionSource + ?Sized>(source: &S) -> Result<(), FarmError> {
    if source.block_per_period() == 0 {
        return Err(FarmError::InvalidConfig(
            "block_per_period must be at least 1".to_string(),
        ));
    }
    for (name, value) in [
        ("keep_percent", source.keep_percent()),
        ("master_chef_weight", source.master_chef_weight()),
        ("incentive_weight", source.incentive_weight()),
    ] {
        if value > 100 {
            return Err(FarmError::InvalidConfig(format!(
                "{} is a percentage but was {}",
                name, value
            )));
        }
    }
    let weights = source.master_chef_weight() + source.incentive_weight();
    if weights > 100 {
        return Err(FarmError::InvalidConfig(format!(
            "master_chef_weight + incentive_weight = {} exceeds 100",
            weights
        )));
    }
    if source.initial_reward_per_block() > Amount::MAX / 100 {
        return Err(FarmError::InvalidConfig(format!(
            "initial_reward_per_block {} is too large",
            source.initial_reward_per_block()
        )));
    }
    if weights < 100 {
        tracing::warn!(
            master_chef_weight = %source.master_chef_weight(),
            incentive_weight = %source.incentive_weight(),
            "Emission weights sum to {}; the remaining {}% is never emitted",
            weights,
            100 - weights
        );
    }
    Ok(())
}

/// The emission schedule snapshot used by the reward engine.
///
/// Built once from an [`EmissionSource`]. All queries are pure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmissionSchedule {
    start_block: BlockNumber,
    block_per_period: BlockNumber,
    maximum_period_index: u64,
    initial_reward_per_block: Amount,
    keep_percent: Amount,
    master_chef_weight: Amount,
    incentive_weight: Amount,
}

impl EmissionSchedule {
    /// Read and validate the parameters of an emission source.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidConfig` when the source fails validation
    /// (see [`EmissionParams::validate`]).
    pub fn from_source<S: EmissionSource + ?Sized>(source: &S) -> Result<Self, FarmError> {
        validate_source(source)?;
        Ok(Self {
            start_block: source.start_block(),
            block_per_period: source.block_per_period(),
            maximum_period_index: source.maximum_period_index(),
            initial_reward_per_block: source.initial_reward_per_block(),
            keep_percent: source.keep_percent(),
            master_chef_weight: source.master_chef_weight(),
            incentive_weight: source.incentive_weight(),
        })
    }

    pub fn start_block(&self) -> BlockNumber {
        self.start_block
    }

    pub fn block_per_period(&self) -> BlockNumber {
        self.block_per_period
    }

    pub fn maximum_period_index(&self) -> u64 {
        self.maximum_period_index
    }

    pub fn master_chef_weight(&self) -> Amount {
        self.master_chef_weight
    }

    pub fn incentive_weight(&self) -> Amount {
        self.incentive_weight
    }

    /// Rate of the period that follows one paying `rate` per block.
    pub fn next_rate(&self, rate: Amount) -> Amount {
        decay(rate, self.keep_percent)
    }

    /// First block that no longer earns reward:
    /// `start_block + block_per_period * (maximum_period_index + 1)`.
    ///
    /// Saturates at `u64::MAX` for schedules that never end in practice.
    pub fn max_block(&self) -> BlockNumber {
        self.maximum_period_index
            .checked_add(1)
            .and_then(|periods| periods.checked_mul(self.block_per_period))
            .and_then(|blocks| blocks.checked_add(self.start_block))
            .unwrap_or(BlockNumber::MAX)
    }

    /// Period index containing `block`. Blocks before the start are in period 0.
    pub fn period_of(&self, block: BlockNumber) -> u64 {
        block.saturating_sub(self.start_block) / self.block_per_period
    }

    /// Reward per block during period `index`.
    ///
    /// Period 0 returns the initial rate exactly. Every later period applies
    /// `* keep_percent / 100` to the previous period's rate, truncating each
    /// step, so rounding loss accumulates the same way it does on chain.
    /// No clamp against `maximum_period_index` is applied here.
    pub fn reward_per_block(&self, index: u64) -> Amount {
        let mut rate = self.initial_reward_per_block;
        if self.keep_percent == 100 {
            return rate;
        }
        for _ in 0..index {
            if rate == 0 {
                break;
            }
            rate = decay(rate, self.keep_percent);
        }
        rate
    }

    /// Total reward emitted over `[from_block, to_block)`, scaled by
    /// `weight_percent / 100` and truncated.
    ///
    /// The range is split on period boundaries and each piece contributes
    /// `blocks * reward_per_block(period)`. `from_block` is clamped up to
    /// `start_block`; `to_block` is clamped down to [`max_block`], so reward
    /// earned before the schedule ended stays claimable forever after.
    ///
    /// [`max_block`]: EmissionSchedule::max_block
    ///
    /// # Errors
    /// Returns `FarmError::ArithmeticOverflow` if the sum does not fit in 128 bits.
    pub fn claimable_reward(
        &self,
        from_block: BlockNumber,
        to_block: BlockNumber,
        weight_percent: Amount,
    ) -> Result<Amount, FarmError> {
        let from = from_block.max(self.start_block);
        let to = to_block.min(self.max_block());
        if from >= to {
            return Ok(0);
        }

        let mut period = self.period_of(from);
        let mut rate = self.reward_per_block(period);
        let mut cursor = from;
        let mut total: Amount = 0;

        while cursor < to && rate > 0 {
            // A flat rate covers the rest of the range in one step.
            let segment_end = if self.keep_percent == 100 {
                to
            } else {
                // `to <= max_block`, so the period end cannot overflow before the loop exits.
                let period_end = self
                    .start_block
                    .saturating_add((period + 1).saturating_mul(self.block_per_period));
                to.min(period_end)
            };
            let blocks = Amount::from(segment_end - cursor);
            let contribution = blocks
                .checked_mul(rate)
                .ok_or(FarmError::ArithmeticOverflow("period reward"))?;
            total = total
                .checked_add(contribution)
                .ok_or(FarmError::ArithmeticOverflow("claimable reward sum"))?;

            cursor = segment_end;
            period += 1;
            rate = decay(rate, self.keep_percent);
        }

        mul_div(total, weight_percent, 100, "claimable reward weighting")
    }

    /// Pool-side share of the emission over `[from_block, to_block)`.
    pub fn master_chef_reward(
        &self,
        from_block: BlockNumber,
        to_block: BlockNumber,
    ) -> Result<Amount, FarmError> {
        self.claimable_reward(from_block, to_block, self.master_chef_weight)
    }
}

fn decay(rate: Amount, keep_percent: Amount) -> Amount {
    // rate <= initial <= Amount::MAX / 100, checked at construction
    rate * keep_percent / 100
}
