// crates/farm-economics/src/chef.rs
//
// The farming controller.
//
// `MasterChef` is the only way to change stake or reward debt. Every
// mutating call follows the same order:
//   1. settle the pool at the current block (staged, nothing written yet),
//   2. fix the depositor's pending reward against the settled accumulator,
//   3. collect the token movements: reward mint, reward payout, principal,
//   4. apply the stake delta and reset the reward debt,
//   5. hand the movements to the ledger as one batch,
//   6. only if the batch succeeded, commit the pool and the position.
// A failure anywhere before step 6 leaves the engine and the ledger unchanged.
//
// Pool 0 is the self-staking pool: its stake asset is the reward token and
// it is entered through `enter_staking` / `leave_staking`, which also mint
// and burn staking receipt tokens.

use serde::{Deserialize, Serialize};

use farm_core::{
    AccountId, Amount, AssetId, BlockNumber, EmissionSource, FarmError, LedgerOp, PoolId,
    TokenLedger,
};

use crate::emission::EmissionSchedule;
use crate::pool::{Pool, PoolRegistry, SettledPool};
use crate::position::{Position, PositionLedger};
use crate::vault::{StakingVault, DEFAULT_RECEIPT_ASSET, DEFAULT_REWARD_ASSET};

/// Id of the self-staking pool created with every controller.
pub const STAKING_POOL: PoolId = 0;

/// Assets, accounts and pool-0 weight used to set up a controller.
///
/// Deserializable from the `[staking]` table of a TOML config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingSettings {
    /// Symbol of the reward token (also the stake asset of pool 0).
    #[serde(default = "default_reward_asset")]
    pub reward_asset: String,

    /// Symbol of the receipt token issued for pool-0 stake.
    #[serde(default = "default_receipt_asset")]
    pub receipt_asset: String,

    /// Allocation weight of pool 0.
    #[serde(default = "default_staking_pool_alloc_point")]
    pub staking_pool_alloc_point: Amount,

    /// Label of the account that holds staked principal.
    #[serde(default = "default_chef_account")]
    pub chef_account: String,

    /// Label of the staking vault account that holds minted rewards.
    #[serde(default = "default_vault_account")]
    pub vault_account: String,
}

fn default_reward_asset() -> String {
    DEFAULT_REWARD_ASSET.to_string()
}

fn default_receipt_asset() -> String {
    DEFAULT_RECEIPT_ASSET.to_string()
}

fn default_staking_pool_alloc_point() -> Amount {
    1_000
}

fn default_chef_account() -> String {
    "master-chef".to_string()
}

fn default_vault_account() -> String {
    "staking-vault".to_string()
}

impl Default for StakingSettings {
    fn default() -> Self {
        Self {
            reward_asset: default_reward_asset(),
            receipt_asset: default_receipt_asset(),
            staking_pool_alloc_point: default_staking_pool_alloc_point(),
            chef_account: default_chef_account(),
            vault_account: default_vault_account(),
        }
    }
}

impl StakingSettings {
    /// Principal and rewards need separate accounts, and receipts must not
    /// be spendable as reward.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidConfig` if the chef and vault accounts or the
    /// reward and receipt assets coincide.
    pub fn validate(&self) -> Result<(), FarmError> {
        if self.chef_account == self.vault_account {
            return Err(FarmError::InvalidConfig(format!(
                "chef and vault must be different accounts, both are '{}'",
                self.chef_account
            )));
        }
        if self.reward_asset == self.receipt_asset {
            return Err(FarmError::InvalidConfig(format!(
                "reward and receipt must be different assets, both are '{}'",
                self.reward_asset
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum StakeChange {
    Deposit(Amount),
    Withdraw(Amount),
}

/// Serializable view of every pool, for reports.
#[derive(Debug, Clone, Serialize)]
pub struct ChefSnapshot {
    pub total_alloc_point: Amount,
    pub pools: Vec<PoolSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshot {
    pub id: PoolId,
    #[serde(flatten)]
    pub pool: Pool,
    pub depositors: usize,
}

impl ChefSnapshot {
    pub fn to_json(&self) -> Result<String, FarmError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Farming controller over a token ledger `L`.
pub struct MasterChef<L: TokenLedger> {
    schedule: EmissionSchedule,
    registry: PoolRegistry,
    positions: PositionLedger,
    vault: StakingVault,
    account: AccountId,
    ledger: L,
}

impl<L: TokenLedger> MasterChef<L> {
    /// Create a controller with the self-staking pool already registered.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidConfig` if the emission source is invalid or
    /// the custody and vault accounts coincide.
    pub fn new<S: EmissionSource + ?Sized>(
        source: &S,
        settings: &StakingSettings,
        ledger: L,
    ) -> Result<Self, FarmError> {
        let schedule = EmissionSchedule::from_source(source)?;
        settings.validate()?;

        let vault = StakingVault::new(
            AccountId::from_label(&settings.vault_account),
            AssetId::new(&settings.reward_asset),
            AssetId::new(&settings.receipt_asset),
        );
        let mut registry = PoolRegistry::new();
        registry.push(
            vault.reward_asset().clone(),
            settings.staking_pool_alloc_point,
            schedule.start_block(),
        )?;

        tracing::info!(
            reward_asset = %vault.reward_asset(),
            start_block = schedule.start_block(),
            max_block = schedule.max_block(),
            staking_pool_alloc_point = %settings.staking_pool_alloc_point,
            "MasterChef initialized"
        );

        Ok(Self {
            schedule,
            registry,
            positions: PositionLedger::new(),
            vault,
            account: AccountId::from_label(&settings.chef_account),
            ledger,
        })
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    pub fn vault(&self) -> &StakingVault {
        &self.vault
    }

    /// Custody account holding all staked principal.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access, for funding accounts. Engine state is unaffected.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn pool_length(&self) -> usize {
        self.registry.len()
    }

    pub fn pool_info(&self, pid: PoolId) -> Result<&Pool, FarmError> {
        self.registry.get(pid)
    }

    pub fn user_info(&self, pid: PoolId, who: &AccountId) -> Result<Position, FarmError> {
        self.registry.get(pid)?;
        Ok(self.positions.position(pid, who))
    }

    pub fn total_alloc_point(&self) -> Amount {
        self.registry.total_alloc_point()
    }

    /// Reward per block during emission period `period`.
    pub fn reward_per_block(&self, period: u64) -> Amount {
        self.schedule.reward_per_block(period)
    }

    /// Pool-side emission from `from_block` up to `current_block`.
    pub fn claimable_reward(
        &self,
        from_block: BlockNumber,
        current_block: BlockNumber,
    ) -> Result<Amount, FarmError> {
        self.schedule.master_chef_reward(from_block, current_block)
    }

    /// Reward `who` would harvest from `pid` at `current_block`.
    ///
    /// Read-only: the pool is settled on a scratch copy. Equals what an
    /// immediate zero-amount deposit (or `leave_staking(0)` for pool 0) pays,
    /// including the cap at what the vault can cover.
    pub fn pending_reward(
        &self,
        pid: PoolId,
        who: &AccountId,
        current_block: BlockNumber,
    ) -> Result<Amount, FarmError> {
        let settled = self.registry.settle(pid, current_block, &self.schedule)?;
        let pending = self
            .positions
            .position(pid, who)
            .pending(settled.acc_reward_per_share())?;
        Ok(pending.min(self.vault_available(&settled)))
    }

    pub fn snapshot(&self) -> ChefSnapshot {
        ChefSnapshot {
            total_alloc_point: self.registry.total_alloc_point(),
            pools: self
                .registry
                .iter()
                .map(|(id, pool)| PoolSnapshot {
                    id,
                    pool: pool.clone(),
                    depositors: self.positions.depositors_in(id),
                })
                .collect(),
        }
    }

    /// Register a new pool.
    ///
    /// With `with_update`, every existing pool is settled first so reward
    /// accrued under the old weights is locked in before the new pool
    /// dilutes them. The pool starts accruing at
    /// `max(current_block, start_block)`.
    pub fn add(
        &mut self,
        alloc_point: Amount,
        stake_asset: AssetId,
        with_update: bool,
        current_block: BlockNumber,
    ) -> Result<PoolId, FarmError> {
        if with_update {
            self.mass_update_pools(current_block)?;
        }
        let first_block = current_block.max(self.schedule.start_block());
        let pid = self.registry.push(stake_asset, alloc_point, first_block)?;
        tracing::info!(
            pool = pid,
            stake_asset = %self.registry.get(pid)?.stake_asset(),
            alloc_point = %alloc_point,
            total_alloc_point = %self.registry.total_alloc_point(),
            "Pool added"
        );
        Ok(pid)
    }

    /// Change the allocation weight of `pid`.
    pub fn set(
        &mut self,
        pid: PoolId,
        alloc_point: Amount,
        with_update: bool,
        current_block: BlockNumber,
    ) -> Result<(), FarmError> {
        self.registry.get(pid)?;
        if with_update {
            self.mass_update_pools(current_block)?;
        }
        let previous = self.registry.set_alloc_point(pid, alloc_point)?;
        tracing::info!(
            pool = pid,
            previous = %previous,
            alloc_point = %alloc_point,
            total_alloc_point = %self.registry.total_alloc_point(),
            "Pool reweighted"
        );
        Ok(())
    }

    /// Settle every pool at `current_block`.
    pub fn mass_update_pools(&mut self, current_block: BlockNumber) -> Result<(), FarmError> {
        let settled = (0..self.registry.len())
            .map(|pid| self.registry.settle(pid, current_block, &self.schedule))
            .collect::<Result<Vec<_>, _>>()?;
        let ops: Vec<LedgerOp> = settled
            .iter()
            .filter(|s| s.minted() > 0)
            .map(|s| self.vault.mint_reward(s.minted()))
            .collect();
        self.ledger.apply(&ops)?;
        for pool in settled {
            self.registry.commit(pool);
        }
        Ok(())
    }

    /// Settle a single pool at `current_block`.
    pub fn update_pool(&mut self, pid: PoolId, current_block: BlockNumber) -> Result<(), FarmError> {
        let settled = self.registry.settle(pid, current_block, &self.schedule)?;
        if settled.minted() > 0 {
            self.ledger.apply(&[self.vault.mint_reward(settled.minted())])?;
        }
        self.registry.commit(settled);
        Ok(())
    }

    /// Stake `amount` of the pool's asset and harvest pending reward.
    ///
    /// `amount == 0` only harvests. Returns the reward paid.
    ///
    /// # Errors
    /// `InvalidPool` for an unknown id or pool 0, `TransferFailure` if `who`
    /// cannot cover the stake, `ArithmeticOverflow` on accumulator overflow.
    pub fn deposit(
        &mut self,
        who: &AccountId,
        pid: PoolId,
        amount: Amount,
        current_block: BlockNumber,
    ) -> Result<Amount, FarmError> {
        self.reject_staking_pool(pid, "deposit")?;
        self.change_stake(who, pid, StakeChange::Deposit(amount), current_block)
    }

    /// Unstake `amount` and harvest pending reward. Returns the reward paid.
    ///
    /// # Errors
    /// `InsufficientStake` when `amount` exceeds the position, plus the
    /// errors of [`deposit`](MasterChef::deposit).
    pub fn withdraw(
        &mut self,
        who: &AccountId,
        pid: PoolId,
        amount: Amount,
        current_block: BlockNumber,
    ) -> Result<Amount, FarmError> {
        self.reject_staking_pool(pid, "withdraw")?;
        self.change_stake(who, pid, StakeChange::Withdraw(amount), current_block)
    }

    /// Stake reward tokens in pool 0. Mints receipts 1:1. Returns the reward paid.
    pub fn enter_staking(
        &mut self,
        who: &AccountId,
        amount: Amount,
        current_block: BlockNumber,
    ) -> Result<Amount, FarmError> {
        self.change_stake(who, STAKING_POOL, StakeChange::Deposit(amount), current_block)
    }

    /// Unstake reward tokens from pool 0. Burns receipts 1:1. Returns the reward paid.
    pub fn leave_staking(
        &mut self,
        who: &AccountId,
        amount: Amount,
        current_block: BlockNumber,
    ) -> Result<Amount, FarmError> {
        self.change_stake(who, STAKING_POOL, StakeChange::Withdraw(amount), current_block)
    }

    /// Withdraw the whole stake of `who` in `pid`, forfeiting pending reward.
    ///
    /// The pool is still settled first, so other depositors keep what they
    /// accrued. Returns the principal returned.
    pub fn emergency_withdraw(
        &mut self,
        who: &AccountId,
        pid: PoolId,
        current_block: BlockNumber,
    ) -> Result<Amount, FarmError> {
        let mut settled = self.registry.settle(pid, current_block, &self.schedule)?;
        let mut staged = self.positions.stage(&settled, who)?;
        let forfeited = staged.pending();
        let amount = staged.clear(&mut settled);
        let staged = staged.finish(&settled)?;

        let mut ops = Vec::new();
        if settled.minted() > 0 {
            ops.push(self.vault.mint_reward(settled.minted()));
        }
        if amount > 0 {
            if pid == STAKING_POOL {
                ops.push(self.vault.burn_receipt(who, amount));
            }
            ops.push(LedgerOp::Transfer {
                asset: settled.pool().stake_asset().clone(),
                from: self.account,
                to: *who,
                amount,
            });
        }
        self.ledger.apply(&ops)?;

        tracing::warn!(
            pool = pid,
            depositor = %who,
            amount = %amount,
            forfeited = %forfeited,
            "Emergency withdraw"
        );
        self.registry.commit(settled);
        self.positions.commit(staged);
        Ok(amount)
    }

    fn reject_staking_pool(&self, pid: PoolId, operation: &str) -> Result<(), FarmError> {
        if pid == STAKING_POOL {
            return Err(FarmError::InvalidPool {
                pool: pid,
                reason: format!(
                    "{} on the staking pool goes through enter_staking/leave_staking",
                    operation
                ),
            });
        }
        Ok(())
    }

    fn change_stake(
        &mut self,
        who: &AccountId,
        pid: PoolId,
        change: StakeChange,
        current_block: BlockNumber,
    ) -> Result<Amount, FarmError> {
        let mut settled = self.registry.settle(pid, current_block, &self.schedule)?;
        let mut staged = self.positions.stage(&settled, who)?;

        let mut ops = Vec::new();
        if settled.minted() > 0 {
            ops.push(self.vault.mint_reward(settled.minted()));
        }
        let mut paid = 0;
        if let Some(payout) = self.reward_payout(&settled, who, staged.pending()) {
            paid = payout.amount();
            ops.push(payout);
        }
        staged.record_payout(paid);

        let stake_asset = settled.pool().stake_asset().clone();
        let self_staking = pid == STAKING_POOL;
        match change {
            StakeChange::Deposit(amount) => {
                if amount > 0 {
                    staged.add(&mut settled, amount)?;
                    ops.push(LedgerOp::Transfer {
                        asset: stake_asset,
                        from: *who,
                        to: self.account,
                        amount,
                    });
                    if self_staking {
                        ops.push(self.vault.mint_receipt(who, amount));
                    }
                }
            }
            StakeChange::Withdraw(amount) => {
                staged.remove(&mut settled, amount)?;
                if amount > 0 {
                    if self_staking {
                        ops.push(self.vault.burn_receipt(who, amount));
                    }
                    ops.push(LedgerOp::Transfer {
                        asset: stake_asset,
                        from: self.account,
                        to: *who,
                        amount,
                    });
                }
            }
        }
        let staged = staged.finish(&settled)?;

        self.ledger.apply(&ops)?;

        tracing::debug!(
            pool = pid,
            depositor = %who,
            change = ?change,
            paid = %paid,
            amount = %staged.amount(),
            block = current_block,
            "Stake changed"
        );
        self.registry.commit(settled);
        self.positions.commit(staged);
        Ok(paid)
    }

    fn reward_payout(
        &self,
        settled: &SettledPool,
        who: &AccountId,
        pending: Amount,
    ) -> Option<LedgerOp> {
        if pending == 0 {
            return None;
        }
        self.vault
            .safe_reward_transfer(self.vault_available(settled), who, pending)
    }

    /// Reward the vault holds once `settled`'s mint lands.
    fn vault_available(&self, settled: &SettledPool) -> Amount {
        self.ledger
            .balance_of(self.vault.reward_asset(), self.vault.account())
            .saturating_add(settled.minted())
    }
}
