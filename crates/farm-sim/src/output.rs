// crates/farm-sim/src/output.rs
//
// Output formatting for the simulator.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use farm_core::{AccountId, Amount, AssetId, BlockNumber, FarmError, TokenLedger};
use farm_economics::{mul_div, EmissionSchedule, InMemoryBank, MasterChef};

/// Output format for simulator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// One emission period.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PeriodRow {
    #[tabled(rename = "Period")]
    pub period: u64,
    #[tabled(rename = "First block")]
    pub first_block: BlockNumber,
    #[tabled(rename = "Last block")]
    pub last_block: BlockNumber,
    #[tabled(rename = "Reward/block")]
    pub reward_per_block: Amount,
    #[tabled(rename = "Pool share")]
    pub master_chef_reward: Amount,
    #[tabled(rename = "Cumulative")]
    pub cumulative: Amount,
}

/// Periods in the schedule, which may exceed what fits in a `usize`.
pub fn period_count(schedule: &EmissionSchedule) -> u128 {
    u128::from(schedule.maximum_period_index()) + 1
}

/// Breakdown of the first `limit` periods of the schedule, in pool-side units.
///
/// The cumulative column keeps a running total at full weight and applies
/// the pool share once, so it truncates the same way `claimable_reward` does.
pub fn schedule_rows(
    schedule: &EmissionSchedule,
    limit: usize,
) -> Result<Vec<PeriodRow>, FarmError> {
    let start = schedule.start_block();
    let len = schedule.block_per_period();
    let weight = schedule.master_chef_weight();
    let last = schedule.maximum_period_index();
    let mut rows = Vec::new();
    let mut emitted: Amount = 0;
    let mut rate = schedule.reward_per_block(0);
    for period in (0..=last).take(limit) {
        if period > 0 {
            rate = schedule.next_rate(rate);
        }
        let first_block = start.saturating_add(period.saturating_mul(len));
        let next = first_block.saturating_add(len);
        let period_total = rate
            .checked_mul(Amount::from(next - first_block))
            .ok_or(FarmError::ArithmeticOverflow("period emission"))?;
        emitted = emitted
            .checked_add(period_total)
            .ok_or(FarmError::ArithmeticOverflow("cumulative emission"))?;
        rows.push(PeriodRow {
            period,
            first_block,
            last_block: next.saturating_sub(1),
            reward_per_block: rate,
            master_chef_reward: mul_div(period_total, weight, 100, "period pool share")?,
            cumulative: mul_div(emitted, weight, 100, "cumulative pool share")?,
        });
    }
    Ok(rows)
}

/// One account's balance of one asset.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct BalanceRow {
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Asset")]
    pub asset: String,
    #[tabled(rename = "Balance")]
    pub balance: Amount,
}

/// Balances of every named account across `assets`, skipping zeros.
pub fn balance_rows(
    ledger: &InMemoryBank,
    accounts: &[(String, AccountId)],
    assets: &[AssetId],
) -> Vec<BalanceRow> {
    let mut rows = Vec::new();
    for (label, account) in accounts {
        for asset in assets {
            let balance = ledger.balance_of(asset, account);
            if balance > 0 {
                rows.push(BalanceRow {
                    account: label.clone(),
                    asset: asset.to_string(),
                    balance,
                });
            }
        }
    }
    rows
}

/// One pool as shown after a scenario run.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PoolRow {
    #[tabled(rename = "Pool")]
    pub id: usize,
    #[tabled(rename = "Asset")]
    pub asset: String,
    #[tabled(rename = "Alloc")]
    pub alloc_point: Amount,
    #[tabled(rename = "Staked")]
    pub total_staked: Amount,
    #[tabled(rename = "Last reward block")]
    pub last_reward_block: BlockNumber,
    #[tabled(rename = "Acc/share (1e12)")]
    pub acc_reward_per_share: Amount,
    #[tabled(rename = "Depositors")]
    pub depositors: usize,
}

pub fn pool_rows(chef: &MasterChef<InMemoryBank>) -> Vec<PoolRow> {
    chef.snapshot()
        .pools
        .into_iter()
        .map(|p| PoolRow {
            id: p.id,
            asset: p.pool.stake_asset().to_string(),
            alloc_point: p.pool.alloc_point(),
            total_staked: p.pool.total_staked(),
            last_reward_block: p.pool.last_reward_block(),
            acc_reward_per_share: p.pool.acc_reward_per_share(),
            depositors: p.depositors,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use farm_economics::EmissionParams;

    #[test]
    fn test_schedule_rows_default_params() {
        let schedule = EmissionSchedule::from_source(&EmissionParams::default()).unwrap();
        let rows = schedule_rows(&schedule, 64).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].first_block, 0);
        assert_eq!(rows[0].last_block, 19);
        assert_eq!(rows[1].reward_per_block, 500);
        assert_eq!(rows[0].master_chef_reward, 10_000);
        assert_eq!(rows[2].cumulative, 17_500);
    }

    #[test]
    fn test_format_table_has_headers() {
        let schedule = EmissionSchedule::from_source(&EmissionParams::default()).unwrap();
        let table = format_table(&schedule_rows(&schedule, 64).unwrap());
        assert!(table.contains("Reward/block"));
        assert!(table.contains("17500"));
    }

    #[test]
    fn test_schedule_rows_respect_limit() {
        let schedule = EmissionSchedule::from_source(&EmissionParams {
            block_per_period: 1,
            maximum_period_index: u64::MAX,
            keep_percent: 100,
            ..EmissionParams::default()
        })
        .unwrap();
        let rows = schedule_rows(&schedule, 10).unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(period_count(&schedule), u128::from(u64::MAX) + 1);
        // 10 blocks at 1000, half to the pools
        assert_eq!(rows[9].cumulative, 5_000);
        assert_eq!(rows[9].cumulative, schedule.master_chef_reward(0, 10).unwrap());
    }

    #[test]
    fn test_cumulative_truncates_once() {
        let schedule = EmissionSchedule::from_source(&EmissionParams {
            block_per_period: 1,
            initial_reward_per_block: 3,
            keep_percent: 100,
            master_chef_weight: 50,
            ..EmissionParams::default()
        })
        .unwrap();
        let rows = schedule_rows(&schedule, 64).unwrap();
        // 3 periods of 3: per-period shares floor to 1, the total to 4
        assert_eq!(rows[0].master_chef_reward, 1);
        assert_eq!(rows[2].cumulative, 4);
        assert_eq!(rows[2].cumulative, schedule.master_chef_reward(0, 3).unwrap());
    }

    #[test]
    fn test_output_format_from_flag() {
        assert_eq!(OutputFormat::from_flag(true), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flag(false), OutputFormat::Table);
    }
}
