//! # Asset Collaborators
//!
//! The vault never moves tokens itself. It asks the contract behind each
//! asset to do it, through the traits defined here:
//!
//! ```text
//! FungibleAsset: transfer / transfer_from / balance_of on one asset
//! NativeWrapper: wrap native currency into a fungible asset and back
//! AssetResolver: find the FungibleAsset behind an AssetId
//! ```
//!
//! Collaborators are shared (`&self` methods, `Send + Sync`) because a
//! collaborator may itself call back into the vault while it runs.
//! Failures are reported as [`CollaboratorError`] and the vault surfaces
//! the message unchanged.
//!
//! [`simulated`] holds in-memory implementations used to exercise the vault
//! without a hosting chain; [`directory`] maps asset ids to them.

pub mod directory;
pub mod simulated;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Address, Amount, AssetId};

pub use directory::AssetDirectory;
pub use simulated::{SimulatedToken, SimulatedWrappedNative};

/// A failure reported by an external asset contract.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    /// Wraps a collaborator's failure message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message exactly as the collaborator reported it.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A fungible asset contract.
pub trait FungibleAsset: Send + Sync {
    /// The asset this contract implements.
    fn id(&self) -> AssetId;

    /// Balance held by `account`.
    fn balance_of(&self, account: &Address) -> Amount;

    /// Moves `amount` from `sender` to `to`.
    fn transfer(&self, sender: &Address, to: &Address, amount: Amount)
        -> Result<(), CollaboratorError>;

    /// Moves `amount` from `owner` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CollaboratorError>;
}

/// Converts native currency into a fungible wrapped asset and back.
pub trait NativeWrapper: Send + Sync {
    /// Identifier of the wrapped asset.
    fn id(&self) -> AssetId;

    /// Wrapped balance held by `account`.
    fn balance_of(&self, account: &Address) -> Amount;

    /// Accepts `value` native currency from `depositor` and credits the same
    /// account with wrapped units. Returns the wrapped amount.
    fn wrap(&self, depositor: &Address, value: Amount) -> Result<Amount, CollaboratorError>;

    /// Burns `amount` wrapped units held by `holder` and pays the native
    /// equivalent to `recipient`. Returns the native amount paid.
    fn unwrap_to(
        &self,
        holder: &Address,
        amount: Amount,
        recipient: &Address,
    ) -> Result<Amount, CollaboratorError>;
}

/// Looks up the contract behind an asset identifier.
pub trait AssetResolver: Send + Sync {
    /// Returns the contract for `asset`, or the error a call to a missing
    /// contract would produce.
    fn resolve(&self, asset: &AssetId) -> Result<Arc<dyn FungibleAsset>, CollaboratorError>;
}
