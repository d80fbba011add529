//! Asset allow-list.
//!
//! Only assets on this list can be deposited. Withdrawals and internal
//! transfers ignore it, so de-listing an asset never traps balances.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use gamevault_protocol::AssetId;

/// Errors raised by allow-list maintenance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The null asset identifier was supplied.
    #[error("asset is the null identifier")]
    InvalidAsset,

    /// Strict listing is on and the asset is already allowed.
    #[error("asset {0} is already allowed")]
    AlreadyAllowed(AssetId),

    /// The asset was never added or has been removed.
    #[error("asset {0} has not been added")]
    NotAllowed(AssetId),
}

/// Set of assets accepted for deposit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRegistry {
    allowed: BTreeSet<AssetId>,
    strict: bool,
}

impl AssetRegistry {
    /// Creates an empty registry. With `strict` set, [`add`](Self::add)
    /// rejects assets that are already allowed.
    pub fn new(strict: bool) -> Self {
        Self {
            allowed: BTreeSet::new(),
            strict,
        }
    }

    /// Whether `asset` is currently allowed.
    pub fn is_allowed(&self, asset: &AssetId) -> bool {
        self.allowed.contains(asset)
    }

    /// Allowed assets in identifier order.
    pub fn allowed(&self) -> Vec<AssetId> {
        self.allowed.iter().copied().collect()
    }

    /// Whether re-adding is an error.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Allows `asset`. Returns `true` if it was not allowed before.
    pub fn add(&mut self, asset: AssetId) -> Result<bool, RegistryError> {
        if asset.is_null() {
            return Err(RegistryError::InvalidAsset);
        }
        let inserted = self.allowed.insert(asset);
        if !inserted && self.strict {
            return Err(RegistryError::AlreadyAllowed(asset));
        }
        debug!(%asset, inserted, "asset allowed");
        Ok(inserted)
    }

    /// Disallows `asset`. The null asset is never allowed, so removing it
    /// fails like any other unlisted asset.
    pub fn remove(&mut self, asset: AssetId) -> Result<(), RegistryError> {
        if !self.allowed.remove(&asset) {
            return Err(RegistryError::NotAllowed(asset));
        }
        debug!(%asset, "asset disallowed");
        Ok(())
    }
}
