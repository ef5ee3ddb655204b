// crates/farm-economics/src/vault.rs
//
// The staking vault.
//
// The vault is the account that receives freshly minted pool rewards and
// pays them out to depositors. It also issues receipt tokens 1:1 for stake
// placed in the self-staking pool (pool 0) and burns them when that stake
// leaves.
//
// Reward payouts are "safe": a payout is capped at what the vault actually
// holds, so truncation dust elsewhere can never make a harvest fail.

use serde::{Deserialize, Serialize};

use farm_core::{AccountId, Amount, AssetId, LedgerOp};

/// Default symbol of the reward token.
pub const DEFAULT_REWARD_ASSET: &str = "ALI";

/// Default symbol of the self-staking receipt token.
pub const DEFAULT_RECEIPT_ASSET: &str = "xALI";

/// Account ids and assets used by the staking vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingVault {
    account: AccountId,
    reward_asset: AssetId,
    receipt_asset: AssetId,
}

impl StakingVault {
    pub fn new(account: AccountId, reward_asset: AssetId, receipt_asset: AssetId) -> Self {
        Self {
            account,
            reward_asset,
            receipt_asset,
        }
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn reward_asset(&self) -> &AssetId {
        &self.reward_asset
    }

    pub fn receipt_asset(&self) -> &AssetId {
        &self.receipt_asset
    }

    /// Mint newly accrued pool reward into the vault.
    pub fn mint_reward(&self, amount: Amount) -> LedgerOp {
        LedgerOp::Mint {
            asset: self.reward_asset.clone(),
            to: self.account,
            amount,
        }
    }

    /// Pay `amount` of reward to `to`, capped at `available` (the vault's
    /// balance once this batch's mints land). `None` when nothing is paid.
    pub fn safe_reward_transfer(
        &self,
        available: Amount,
        to: &AccountId,
        amount: Amount,
    ) -> Option<LedgerOp> {
        let paid = amount.min(available);
        if paid < amount {
            tracing::warn!(
                requested = %amount,
                available = %available,
                recipient = %to,
                "Reward payout capped at vault balance"
            );
        }
        if paid == 0 {
            return None;
        }
        Some(LedgerOp::Transfer {
            asset: self.reward_asset.clone(),
            from: self.account,
            to: *to,
            amount: paid,
        })
    }

    /// Issue receipt tokens for self-staked principal.
    pub fn mint_receipt(&self, to: &AccountId, amount: Amount) -> LedgerOp {
        LedgerOp::Mint {
            asset: self.receipt_asset.clone(),
            to: *to,
            amount,
        }
    }

    /// Burn receipt tokens when self-staked principal is withdrawn.
    pub fn burn_receipt(&self, from: &AccountId, amount: Amount) -> LedgerOp {
        LedgerOp::Burn {
            asset: self.receipt_asset.clone(),
            from: *from,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> StakingVault {
        StakingVault::new(
            AccountId::from_label("staking-vault"),
            AssetId::new(DEFAULT_REWARD_ASSET),
            AssetId::new(DEFAULT_RECEIPT_ASSET),
        )
    }

    #[test]
    fn test_safe_transfer_full_amount() {
        let alice = AccountId::from_label("alice");
        let op = vault().safe_reward_transfer(1_000, &alice, 400).unwrap();
        assert_eq!(op.amount(), 400);
        assert_eq!(op.asset().symbol(), "ALI");
    }

    #[test]
    fn test_safe_transfer_is_capped() {
        let alice = AccountId::from_label("alice");
        let op = vault().safe_reward_transfer(150, &alice, 400).unwrap();
        assert_eq!(op.amount(), 150);
    }

    #[test]
    fn test_safe_transfer_nothing_to_pay() {
        let alice = AccountId::from_label("alice");
        assert!(vault().safe_reward_transfer(0, &alice, 400).is_none());
        assert!(vault().safe_reward_transfer(1_000, &alice, 0).is_none());
    }

    #[test]
    fn test_receipt_ops_use_receipt_asset() {
        let alice = AccountId::from_label("alice");
        let v = vault();
        assert_eq!(v.mint_receipt(&alice, 10).asset().symbol(), "xALI");
        assert_eq!(v.burn_receipt(&alice, 10).asset().symbol(), "xALI");
    }
}
