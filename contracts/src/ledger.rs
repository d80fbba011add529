//! # Custody Ledger
//!
//! Maps `(asset, account)` to the amount the vault owes that account. The
//! ledger enforces that no balance ever goes negative and that no credit
//! wraps around, and it keeps two per-asset aggregates next to the balances:
//!
//! - **total**: sum of every account balance for the asset;
//! - **net inflow**: everything deposited minus everything withdrawn.
//!
//! Internal transfers change neither aggregate except for the fee cut, which
//! leaves the totals and lands in the fee pool. The vault's conservation
//! invariant is therefore `total + fee_pool == net_inflow` for every asset.
//!
//! Every fallible operation computes all resulting values before writing
//! any of them. An `Err` means nothing changed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gamevault_protocol::{Address, Amount, AssetId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Attempted to debit more than the account holds.
    #[error("insufficient balance: {account} holds {available} of {asset}, requested {requested}")]
    InsufficientBalance {
        /// Asset being debited.
        asset: AssetId,
        /// Account being debited.
        account: Address,
        /// Current balance.
        available: Amount,
        /// Amount requested.
        requested: Amount,
    },

    /// A credit would exceed `u128::MAX`.
    #[error("balance overflow: {account} holds {current} of {asset}, credit {credit}")]
    Overflow {
        /// Asset being credited.
        asset: AssetId,
        /// Account being credited.
        account: Address,
        /// Balance before the failed credit.
        current: Amount,
        /// Amount that caused the overflow.
        credit: Amount,
    },

    /// A per-asset aggregate (total or net inflow) would overflow or go
    /// negative. Only reachable if the conservation invariant was broken.
    #[error("custody aggregate out of range for {asset}")]
    AggregateOutOfRange {
        /// Asset whose aggregate failed.
        asset: AssetId,
    },
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Per-asset, per-account balances plus custody aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// `asset -> (account -> balance)`. Zero balances are not stored.
    balances: HashMap<AssetId, HashMap<Address, Amount>>,
    /// `asset -> sum of balances`.
    totals: HashMap<AssetId, Amount>,
    /// `asset -> deposited - withdrawn`.
    net_inflow: HashMap<AssetId, Amount>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account` in `asset`, zero if never touched.
    pub fn balance_of(&self, asset: &AssetId, account: &Address) -> Amount {
        self.balances
            .get(asset)
            .and_then(|accounts| accounts.get(account))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all account balances in `asset`.
    pub fn total_of(&self, asset: &AssetId) -> Amount {
        self.totals.get(asset).copied().unwrap_or(0)
    }

    /// Deposited minus withdrawn for `asset`.
    pub fn net_inflow_of(&self, asset: &AssetId) -> Amount {
        self.net_inflow.get(asset).copied().unwrap_or(0)
    }

    /// Non-zero balances in `asset`, sorted by account.
    pub fn accounts(&self, asset: &AssetId) -> Vec<(Address, Amount)> {
        let mut out: Vec<(Address, Amount)> = self
            .balances
            .get(asset)
            .map(|accounts| accounts.iter().map(|(a, b)| (*a, *b)).collect())
            .unwrap_or_default();
        out.sort_by_key(|(account, _)| *account);
        out
    }

    /// Every asset that has ever carried a balance or an inflow.
    pub fn assets(&self) -> Vec<AssetId> {
        let mut out: Vec<AssetId> = self.net_inflow.keys().copied().collect();
        for asset in self.totals.keys() {
            if !out.contains(asset) {
                out.push(*asset);
            }
        }
        out.sort();
        out
    }

    /// Checks the stored aggregates against the balances they summarize.
    ///
    /// Operations on a live ledger keep these in step; a ledger decoded from
    /// outside may not. Returns a description of the first problem found:
    /// an entry under the null asset, a stored zero balance, or a total that
    /// differs from the sum of its balances.
    pub fn audit(&self) -> Result<(), String> {
        let null_keyed = self.balances.keys().any(AssetId::is_null)
            || self.totals.keys().any(AssetId::is_null)
            || self.net_inflow.keys().any(AssetId::is_null);
        if null_keyed {
            return Err("entries recorded under the null asset".to_string());
        }

        for (asset, accounts) in &self.balances {
            let mut sum: Amount = 0;
            for (account, balance) in accounts {
                if *balance == 0 {
                    return Err(format!("zero balance stored for {account} in {asset}"));
                }
                sum = sum
                    .checked_add(*balance)
                    .ok_or_else(|| format!("balances of {asset} exceed the amount range"))?;
            }
            let total = self.total_of(asset);
            if sum != total {
                return Err(format!("total of {asset} is {total}, balances sum to {sum}"));
            }
        }

        for (asset, total) in &self.totals {
            if *total != 0 && !self.balances.contains_key(asset) {
                return Err(format!("total of {asset} is {total} with no balances"));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Balance Operations
    // -----------------------------------------------------------------------

    /// Adds `amount` to `account`'s balance. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the balance would exceed
    /// `u128::MAX`.
    pub fn credit(
        &mut self,
        asset: AssetId,
        account: Address,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let (balance, total) = self.plan_credit(asset, account, amount)?;
        self.set_balance(asset, account, balance);
        self.totals.insert(asset, total);
        Ok(balance)
    }

    /// Subtracts `amount` from `account`'s balance. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientBalance`] if `amount` exceeds the
    /// current balance.
    pub fn debit(
        &mut self,
        asset: AssetId,
        account: Address,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let (balance, total) = self.plan_debit(asset, account, amount)?;
        self.set_balance(asset, account, balance);
        self.totals.insert(asset, total);
        Ok(balance)
    }

    /// Moves value between two accounts of the same asset.
    ///
    /// `from` loses `debit_amount`, `to` gains `credit_amount`. The
    /// difference (the fee cut) leaves the account totals; the caller is
    /// responsible for booking it elsewhere. `from == to` is allowed.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InsufficientBalance`] if `from` cannot cover
    /// `debit_amount`, [`LedgerError::Overflow`] if `to` cannot absorb
    /// `credit_amount`. On error nothing is written.
    pub fn transfer(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        debit_amount: Amount,
        credit_amount: Amount,
    ) -> Result<(), LedgerError> {
        debug_assert!(credit_amount <= debit_amount);

        let from_before = self.balance_of(&asset, &from);
        let from_after = from_before
            .checked_sub(debit_amount)
            .ok_or(LedgerError::InsufficientBalance {
                asset,
                account: from,
                available: from_before,
                requested: debit_amount,
            })?;

        let to_before = if from == to {
            from_after
        } else {
            self.balance_of(&asset, &to)
        };
        let to_after = to_before
            .checked_add(credit_amount)
            .ok_or(LedgerError::Overflow {
                asset,
                account: to,
                current: to_before,
                credit: credit_amount,
            })?;

        let total = self
            .total_of(&asset)
            .checked_sub(debit_amount - credit_amount)
            .ok_or(LedgerError::AggregateOutOfRange { asset })?;

        self.set_balance(asset, from, from_after);
        self.set_balance(asset, to, to_after);
        self.totals.insert(asset, total);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // External Movements
    // -----------------------------------------------------------------------

    /// Books tokens that entered custody on behalf of `account`: credits the
    /// account and raises the asset's net inflow. Returns the new balance.
    pub fn record_deposit(
        &mut self,
        asset: AssetId,
        account: Address,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let (balance, total) = self.plan_credit(asset, account, amount)?;
        let inflow = self
            .net_inflow_of(&asset)
            .checked_add(amount)
            .ok_or(LedgerError::AggregateOutOfRange { asset })?;

        self.set_balance(asset, account, balance);
        self.totals.insert(asset, total);
        self.net_inflow.insert(asset, inflow);
        Ok(balance)
    }

    /// Books tokens leaving custody to `account`: debits the account and
    /// lowers the asset's net inflow. Returns the new balance.
    pub fn record_withdrawal(
        &mut self,
        asset: AssetId,
        account: Address,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        let (balance, total) = self.plan_debit(asset, account, amount)?;
        let inflow = self
            .net_inflow_of(&asset)
            .checked_sub(amount)
            .ok_or(LedgerError::AggregateOutOfRange { asset })?;

        self.set_balance(asset, account, balance);
        self.totals.insert(asset, total);
        self.net_inflow.insert(asset, inflow);
        Ok(balance)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn plan_credit(
        &self,
        asset: AssetId,
        account: Address,
        amount: Amount,
    ) -> Result<(Amount, Amount), LedgerError> {
        let current = self.balance_of(&asset, &account);
        let balance = current.checked_add(amount).ok_or(LedgerError::Overflow {
            asset,
            account,
            current,
            credit: amount,
        })?;
        let total = self
            .total_of(&asset)
            .checked_add(amount)
            .ok_or(LedgerError::AggregateOutOfRange { asset })?;
        Ok((balance, total))
    }

    fn plan_debit(
        &self,
        asset: AssetId,
        account: Address,
        amount: Amount,
    ) -> Result<(Amount, Amount), LedgerError> {
        let current = self.balance_of(&asset, &account);
        let balance = current
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                asset,
                account,
                available: current,
                requested: amount,
            })?;
        let total = self
            .total_of(&asset)
            .checked_sub(amount)
            .ok_or(LedgerError::AggregateOutOfRange { asset })?;
        Ok((balance, total))
    }

    fn set_balance(&mut self, asset: AssetId, account: Address, balance: Amount) {
        let accounts = self.balances.entry(asset).or_default();
        if balance == 0 {
            accounts.remove(&account);
        } else {
            accounts.insert(account, balance);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
