// crates/farm-core/src/units.rs

/// Token amount in the smallest unit of its asset.
///
/// 128 bits so that `amount * 1e12` fixed-point products fit comfortably.
pub type Amount = u128;

/// Block height on the host chain.
pub type BlockNumber = u64;

/// Index of a pool in the registry. Pool 0 is the self-staking pool.
pub type PoolId = usize;
