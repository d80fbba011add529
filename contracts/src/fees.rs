//! # Transfer Fees
//!
//! Internal transfers may carry a proportional fee. When the fee switch is
//! on, a transfer of `amount` splits into
//!
//! ```text
//! fee = amount * numerator / denominator   (multiply first, rounded down)
//! net = amount - fee
//! ```
//!
//! The floor remainder stays with the recipient, and `net + fee == amount`
//! holds exactly. The fee accrues in a per-asset pool that belongs to no
//! account.
//!
//! Fee computation is split from booking. [`FeePolicy::quote`] produces a
//! [`FeeQuote`] without touching state, so the caller can run every other
//! check first and only then [`commit`](FeePolicy::commit) it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gamevault_protocol::config::VaultConfig;
use gamevault_protocol::{Amount, AssetId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while computing or booking a fee.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    /// `amount * numerator` does not fit in `u128`.
    #[error("fee computation overflows for amount {amount}")]
    Overflow {
        /// Gross transfer amount.
        amount: Amount,
    },

    /// Adding the fee would overflow the asset's pool.
    #[error("fee pool overflow for {asset}")]
    PoolOverflow {
        /// Asset whose pool is full.
        asset: AssetId,
    },

    /// The configured rate is unusable.
    #[error("invalid fee rate {numerator}/{denominator}")]
    InvalidRate {
        /// Numerator.
        numerator: u128,
        /// Denominator.
        denominator: u128,
    },
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// The breakdown of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    /// Asset being transferred.
    pub asset: AssetId,
    /// Amount debited from the sender.
    pub gross: Amount,
    /// Amount credited to the recipient.
    pub net: Amount,
    /// Amount added to the fee pool.
    pub fee: Amount,
    /// Pool balance once this quote is committed.
    pub pool_after: Amount,
}

// ---------------------------------------------------------------------------
// FeePolicy
// ---------------------------------------------------------------------------

/// Fee switch, fee rate and accrued fee pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePolicy {
    fee_on: bool,
    numerator: u128,
    denominator: u128,
    pools: HashMap<AssetId, Amount>,
}

impl FeePolicy {
    /// Creates a policy with the given rate and an empty pool.
    pub fn new(numerator: u128, denominator: u128, fee_on: bool) -> Result<Self, FeeError> {
        let policy = Self {
            fee_on,
            numerator,
            denominator,
            pools: HashMap::new(),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Builds the policy described by `config`.
    pub fn from_config(config: &VaultConfig) -> Result<Self, FeeError> {
        Self::new(config.fee_numerator, config.fee_denominator, config.fee_on)
    }

    /// Checks that `0 <= numerator <= denominator` and `denominator > 0`.
    pub fn validate(&self) -> Result<(), FeeError> {
        if self.denominator == 0 || self.numerator > self.denominator {
            return Err(FeeError::InvalidRate {
                numerator: self.numerator,
                denominator: self.denominator,
            });
        }
        Ok(())
    }

    /// Whether transfers currently carry a fee.
    pub fn fee_on(&self) -> bool {
        self.fee_on
    }

    /// Flips the fee switch. Returns the previous setting.
    pub fn set_fee_on(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.fee_on, on)
    }

    /// Fee numerator.
    pub fn numerator(&self) -> u128 {
        self.numerator
    }

    /// Fee denominator.
    pub fn denominator(&self) -> u128 {
        self.denominator
    }

    /// Fees accrued for `asset`.
    pub fn pool_of(&self, asset: &AssetId) -> Amount {
        self.pools.get(asset).copied().unwrap_or(0)
    }

    /// Assets with a fee pool entry, sorted.
    pub fn pooled_assets(&self) -> Vec<AssetId> {
        let mut out: Vec<AssetId> = self.pools.keys().copied().collect();
        out.sort();
        out
    }

    /// Splits `amount` into `(net, fee)` under the current switch and rate.
    pub fn compute_fee(&self, amount: Amount) -> Result<(Amount, Amount), FeeError> {
        if !self.fee_on {
            return Ok((amount, 0));
        }
        let fee = amount
            .checked_mul(self.numerator)
            .ok_or(FeeError::Overflow { amount })?
            .checked_div(self.denominator)
            .ok_or(FeeError::InvalidRate {
                numerator: self.numerator,
                denominator: self.denominator,
            })?;
        Ok((amount - fee, fee))
    }

    /// Prices a transfer of `amount` in `asset` without booking anything.
    pub fn quote(&self, asset: AssetId, amount: Amount) -> Result<FeeQuote, FeeError> {
        let (net, fee) = self.compute_fee(amount)?;
        let pool_after = self
            .pool_of(&asset)
            .checked_add(fee)
            .ok_or(FeeError::PoolOverflow { asset })?;
        Ok(FeeQuote {
            asset,
            gross: amount,
            net,
            fee,
            pool_after,
        })
    }

    /// Books a quote produced by [`quote`](Self::quote) on this policy.
    pub fn commit(&mut self, quote: &FeeQuote) {
        if quote.fee > 0 {
            self.pools.insert(quote.asset, quote.pool_after);
        }
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        let config = VaultConfig::default();
        Self {
            fee_on: config.fee_on,
            numerator: config.fee_numerator,
            denominator: config.fee_denominator,
            pools: HashMap::new(),
        }
    }
}
