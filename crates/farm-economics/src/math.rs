// crates/farm-economics/src/math.rs
//
// Fixed-point helpers for the reward accumulator. Every multiply happens
// before its divide and is checked; truncation always rounds toward zero.

use farm_core::{Amount, FarmError};

/// Scale of `acc_reward_per_share`: reward per staked unit times 10^12.
pub const ACC_REWARD_PRECISION: Amount = 1_000_000_000_000;

/// `a * b / denominator`, truncating.
///
/// # Errors
/// Returns `FarmError::ArithmeticOverflow(context)` if `a * b` does not fit,
/// or if `denominator` is zero.
pub fn mul_div(
    a: Amount,
    b: Amount,
    denominator: Amount,
    context: &'static str,
) -> Result<Amount, FarmError> {
    if denominator == 0 {
        return Err(FarmError::ArithmeticOverflow(context));
    }
    a.checked_mul(b)
        .map(|product| product / denominator)
        .ok_or(FarmError::ArithmeticOverflow(context))
}

/// Reward accrued by `amount` staked units at accumulator value `acc_reward_per_share`.
pub fn accrued_reward(amount: Amount, acc_reward_per_share: Amount) -> Result<Amount, FarmError> {
    mul_div(
        amount,
        acc_reward_per_share,
        ACC_REWARD_PRECISION,
        "accrued reward",
    )
}

/// Accumulator increment for `reward` spread over `supply` staked units.
pub fn reward_per_share(reward: Amount, supply: Amount) -> Result<Amount, FarmError> {
    mul_div(reward, ACC_REWARD_PRECISION, supply, "reward per share")
}
