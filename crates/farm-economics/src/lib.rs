// crates/farm-economics/src/lib.rs
//
// farm-economics: emission schedule, reward accrual, pool registry,
// position ledger, staking vault, and the `MasterChef` farming controller.
//
// Amounts are integers in the smallest unit of their asset. Reward per
// share is fixed point at 10^12 (`ACC_REWARD_PRECISION`).

pub mod bank;
pub mod chef;
pub mod emission;
pub mod math;
pub mod pool;
pub mod position;
pub mod vault;

// Re-export key types for ergonomic access from downstream crates.
pub use bank::InMemoryBank;
pub use chef::{ChefSnapshot, MasterChef, PoolSnapshot, StakingSettings, STAKING_POOL};
pub use emission::{EmissionParams, EmissionSchedule};
pub use math::{accrued_reward, mul_div, reward_per_share, ACC_REWARD_PRECISION};
pub use pool::{Pool, PoolRegistry, SettledPool};
pub use position::{Position, PositionLedger, StagedPosition};
pub use vault::{StakingVault, DEFAULT_RECEIPT_ASSET, DEFAULT_REWARD_ASSET};
