// crates/farm-sim/src/scenario.rs
//
// Scripted scenarios.
//
// A scenario is a TOML file with a list of `[[step]]` tables, each tagged by
// `action`. Steps run in order against a fresh controller backed by an
// in-memory bank. The block clock starts at `start_block` and only moves on
// `advance` / `advance_to` steps.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use farm_core::{AccountId, Amount, AssetId, BlockNumber, EmissionSource, FarmError, PoolId};
use farm_economics::{InMemoryBank, MasterChef, StakingSettings};

use crate::output::{balance_rows, pool_rows, BalanceRow, PoolRow};

/// A scripted run.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Block the clock starts at.
    #[serde(default)]
    pub start_block: BlockNumber,

    /// Record failed steps and keep going instead of aborting the run.
    #[serde(default)]
    pub continue_on_error: bool,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One scripted action. Accounts and assets are referred to by label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Mint tokens straight into an account.
    Fund {
        account: String,
        asset: String,
        amount: Amount,
    },
    Add {
        alloc_point: Amount,
        asset: String,
        #[serde(default)]
        with_update: bool,
    },
    Set {
        pool: PoolId,
        alloc_point: Amount,
        #[serde(default)]
        with_update: bool,
    },
    Deposit {
        account: String,
        pool: PoolId,
        amount: Amount,
    },
    Withdraw {
        account: String,
        pool: PoolId,
        amount: Amount,
    },
    EnterStaking {
        account: String,
        amount: Amount,
    },
    LeaveStaking {
        account: String,
        amount: Amount,
    },
    EmergencyWithdraw {
        account: String,
        pool: PoolId,
    },
    UpdatePool {
        pool: PoolId,
    },
    MassUpdatePools,
    /// Report what an account could harvest right now.
    Pending {
        account: String,
        pool: PoolId,
    },
    Advance {
        blocks: BlockNumber,
    },
    AdvanceTo {
        block: BlockNumber,
    },
}

impl Step {
    fn describe(&self) -> String {
        match self {
            Step::Fund {
                account,
                asset,
                amount,
            } => format!("fund {} {} {}", account, amount, asset),
            Step::Add {
                alloc_point,
                asset,
                with_update,
            } => format!("add {} alloc={} update={}", asset, alloc_point, with_update),
            Step::Set {
                pool,
                alloc_point,
                with_update,
            } => format!("set pool {} alloc={} update={}", pool, alloc_point, with_update),
            Step::Deposit {
                account,
                pool,
                amount,
            } => format!("{} deposit {} into pool {}", account, amount, pool),
            Step::Withdraw {
                account,
                pool,
                amount,
            } => format!("{} withdraw {} from pool {}", account, amount, pool),
            Step::EnterStaking { account, amount } => format!("{} enter staking {}", account, amount),
            Step::LeaveStaking { account, amount } => format!("{} leave staking {}", account, amount),
            Step::EmergencyWithdraw { account, pool } => {
                format!("{} emergency withdraw from pool {}", account, pool)
            }
            Step::UpdatePool { pool } => format!("update pool {}", pool),
            Step::MassUpdatePools => "mass update pools".to_string(),
            Step::Pending { account, pool } => format!("{} pending in pool {}", account, pool),
            Step::Advance { blocks } => format!("advance {} blocks", blocks),
            Step::AdvanceTo { block } => format!("advance to block {}", block),
        }
    }
}

impl Scenario {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let scenario: Scenario = toml::from_str(&contents)?;
        Ok(scenario)
    }
}

/// Result of one step.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct StepOutcome {
    #[tabled(rename = "Block")]
    pub block: BlockNumber,
    #[tabled(rename = "Step")]
    pub step: String,
    #[tabled(rename = "Result")]
    pub result: String,
}

/// Everything a finished run reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub final_block: BlockNumber,
    pub steps: Vec<StepOutcome>,
    pub pools: Vec<PoolRow>,
    pub balances: Vec<BalanceRow>,
}

/// Drives a [`MasterChef`] through a scenario.
pub struct ScenarioRunner {
    chef: MasterChef<InMemoryBank>,
    block: BlockNumber,
    accounts: BTreeMap<String, AccountId>,
    assets: BTreeSet<AssetId>,
}

impl ScenarioRunner {
    pub fn new<S: EmissionSource + ?Sized>(
        emission: &S,
        staking: &StakingSettings,
        start_block: BlockNumber,
    ) -> Result<Self, FarmError> {
        let chef = MasterChef::new(emission, staking, InMemoryBank::new())?;
        let mut accounts = BTreeMap::new();
        accounts.insert(staking.chef_account.clone(), *chef.account());
        accounts.insert(staking.vault_account.clone(), *chef.vault().account());
        let assets = [
            chef.vault().reward_asset().clone(),
            chef.vault().receipt_asset().clone(),
        ]
        .into_iter()
        .collect();
        Ok(Self {
            chef,
            block: start_block,
            accounts,
            assets,
        })
    }

    pub fn chef(&self) -> &MasterChef<InMemoryBank> {
        &self.chef
    }

    pub fn block(&self) -> BlockNumber {
        self.block
    }

    fn account(&mut self, label: &str) -> AccountId {
        *self
            .accounts
            .entry(label.to_string())
            .or_insert_with(|| AccountId::from_label(label))
    }

    fn asset(&mut self, symbol: &str) -> AssetId {
        let asset = AssetId::new(symbol);
        self.assets.insert(asset.clone());
        asset
    }

    /// Apply one step; returns a short human-readable result.
    pub fn step(&mut self, step: &Step) -> Result<String, FarmError> {
        let block = self.block;
        let result = match step {
            Step::Fund {
                account,
                asset,
                amount,
            } => {
                let (who, asset) = (self.account(account), self.asset(asset));
                self.chef.ledger_mut().fund(&asset, &who, *amount)?;
                "ok".to_string()
            }
            Step::Add {
                alloc_point,
                asset,
                with_update,
            } => {
                let asset = self.asset(asset);
                let pid = self.chef.add(*alloc_point, asset, *with_update, block)?;
                format!("pool {}", pid)
            }
            Step::Set {
                pool,
                alloc_point,
                with_update,
            } => {
                self.chef.set(*pool, *alloc_point, *with_update, block)?;
                format!("total alloc {}", self.chef.total_alloc_point())
            }
            Step::Deposit {
                account,
                pool,
                amount,
            } => {
                let who = self.account(account);
                let paid = self.chef.deposit(&who, *pool, *amount, block)?;
                format!("harvested {}", paid)
            }
            Step::Withdraw {
                account,
                pool,
                amount,
            } => {
                let who = self.account(account);
                let paid = self.chef.withdraw(&who, *pool, *amount, block)?;
                format!("harvested {}", paid)
            }
            Step::EnterStaking { account, amount } => {
                let who = self.account(account);
                let paid = self.chef.enter_staking(&who, *amount, block)?;
                format!("harvested {}", paid)
            }
            Step::LeaveStaking { account, amount } => {
                let who = self.account(account);
                let paid = self.chef.leave_staking(&who, *amount, block)?;
                format!("harvested {}", paid)
            }
            Step::EmergencyWithdraw { account, pool } => {
                let who = self.account(account);
                let returned = self.chef.emergency_withdraw(&who, *pool, block)?;
                format!("returned {}", returned)
            }
            Step::UpdatePool { pool } => {
                self.chef.update_pool(*pool, block)?;
                "ok".to_string()
            }
            Step::MassUpdatePools => {
                self.chef.mass_update_pools(block)?;
                "ok".to_string()
            }
            Step::Pending { account, pool } => {
                let who = self.account(account);
                format!("{}", self.chef.pending_reward(*pool, &who, block)?)
            }
            Step::Advance { blocks } => {
                self.block = self
                    .block
                    .checked_add(*blocks)
                    .ok_or(FarmError::ArithmeticOverflow("block clock"))?;
                format!("now at {}", self.block)
            }
            Step::AdvanceTo { block: target } => {
                if *target < self.block {
                    return Err(FarmError::InvalidConfig(format!(
                        "cannot move the clock back from {} to {}",
                        self.block, target
                    )));
                }
                self.block = *target;
                format!("now at {}", self.block)
            }
        };
        Ok(result)
    }

    /// Run every step of `scenario` and collect the final state.
    ///
    /// # Errors
    /// Returns the first step error unless `continue_on_error` is set.
    pub fn run(mut self, scenario: &Scenario) -> Result<RunReport, FarmError> {
        let mut outcomes = Vec::with_capacity(scenario.steps.len());
        for step in &scenario.steps {
            let block = self.block;
            let result = match self.step(step) {
                Ok(result) => result,
                Err(e) if scenario.continue_on_error => {
                    tracing::warn!(block, step = %step.describe(), error = %e, "Step failed");
                    format!("error: {}", e)
                }
                Err(e) => return Err(e),
            };
            tracing::debug!(block, step = %step.describe(), %result, "Step applied");
            outcomes.push(StepOutcome {
                block,
                step: step.describe(),
                result,
            });
        }

        let accounts: Vec<(String, AccountId)> = self
            .accounts
            .iter()
            .map(|(label, id)| (label.clone(), *id))
            .collect();
        let assets: Vec<AssetId> = self.assets.iter().cloned().collect();
        Ok(RunReport {
            final_block: self.block,
            steps: outcomes,
            pools: pool_rows(&self.chef),
            balances: balance_rows(self.chef.ledger(), &accounts, &assets),
        })
    }
}
