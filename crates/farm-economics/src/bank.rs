// crates/farm-economics/src/bank.rs
//
// In-memory token ledger.
//
// Backs simulations and tests. A batch is applied to a scratch copy of the
// balances it touches; the scratch values are written back only if every op
// in the batch succeeded.

use std::collections::HashMap;

use farm_core::{AccountId, Amount, AssetId, FarmError, LedgerOp, TokenLedger};

/// Balances and supplies for any number of assets, held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBank {
    balances: HashMap<(AssetId, AccountId), Amount>,
    supply: HashMap<AssetId, Amount>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `amount` of `asset` straight into `account`.
    pub fn fund(
        &mut self,
        asset: &AssetId,
        account: &AccountId,
        amount: Amount,
    ) -> Result<(), FarmError> {
        self.apply(&[LedgerOp::Mint {
            asset: asset.clone(),
            to: *account,
            amount,
        }])
    }

    /// Every non-zero balance of `asset`.
    pub fn holders(&self, asset: &AssetId) -> Vec<(AccountId, Amount)> {
        let mut holders: Vec<_> = self
            .balances
            .iter()
            .filter(|((a, _), amount)| a == asset && **amount > 0)
            .map(|((_, account), amount)| (*account, *amount))
            .collect();
        holders.sort();
        holders
    }
}

/// Balances touched by one batch, layered over the committed state.
struct Scratch<'a> {
    bank: &'a InMemoryBank,
    balances: HashMap<(AssetId, AccountId), Amount>,
    supply: HashMap<AssetId, Amount>,
}

impl<'a> Scratch<'a> {
    fn new(bank: &'a InMemoryBank) -> Self {
        Self {
            bank,
            balances: HashMap::new(),
            supply: HashMap::new(),
        }
    }

    fn balance(&self, asset: &AssetId, account: &AccountId) -> Amount {
        let key = (asset.clone(), *account);
        self.balances
            .get(&key)
            .copied()
            .unwrap_or_else(|| self.bank.balance_of(asset, account))
    }

    fn supply_of(&self, asset: &AssetId) -> Amount {
        self.supply
            .get(asset)
            .copied()
            .unwrap_or_else(|| self.bank.total_supply(asset))
    }

    fn credit(&mut self, asset: &AssetId, account: &AccountId, amount: Amount) -> Result<(), FarmError> {
        let balance = self
            .balance(asset, account)
            .checked_add(amount)
            .ok_or(FarmError::ArithmeticOverflow("ledger balance"))?;
        self.balances.insert((asset.clone(), *account), balance);
        Ok(())
    }

    fn debit(&mut self, asset: &AssetId, account: &AccountId, amount: Amount) -> Result<(), FarmError> {
        let balance = self.balance(asset, account);
        if balance < amount {
            return Err(FarmError::TransferFailure(format!(
                "{} holds {} {} but {} is required",
                account, balance, asset, amount
            )));
        }
        self.balances
            .insert((asset.clone(), *account), balance - amount);
        Ok(())
    }

    fn apply(&mut self, op: &LedgerOp) -> Result<(), FarmError> {
        match op {
            LedgerOp::Mint { asset, to, amount } => {
                let supply = self
                    .supply_of(asset)
                    .checked_add(*amount)
                    .ok_or(FarmError::ArithmeticOverflow("asset supply"))?;
                self.credit(asset, to, *amount)?;
                self.supply.insert(asset.clone(), supply);
            }
            LedgerOp::Burn { asset, from, amount } => {
                self.debit(asset, from, *amount)?;
                let supply = self.supply_of(asset).saturating_sub(*amount);
                self.supply.insert(asset.clone(), supply);
            }
            LedgerOp::Transfer {
                asset,
                from,
                to,
                amount,
            } => {
                self.debit(asset, from, *amount)?;
                self.credit(asset, to, *amount)?;
            }
        }
        Ok(())
    }
}

impl TokenLedger for InMemoryBank {
    fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.balances
            .get(&(asset.clone(), *account))
            .copied()
            .unwrap_or(0)
    }

    fn total_supply(&self, asset: &AssetId) -> Amount {
        self.supply.get(asset).copied().unwrap_or(0)
    }

    fn apply(&mut self, ops: &[LedgerOp]) -> Result<(), FarmError> {
        let mut scratch = Scratch::new(self);
        for op in ops {
            scratch.apply(op)?;
        }
        let Scratch {
            balances, supply, ..
        } = scratch;
        self.balances.extend(balances);
        self.supply.extend(supply);
        Ok(())
    }
}
