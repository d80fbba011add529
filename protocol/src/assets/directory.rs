//! Asset directory: `AssetId -> Arc<dyn FungibleAsset>`.
//!
//! Plays the part of the hosting chain's address space. Lookups of an
//! unregistered id fail the same way a call to an empty address would.

use std::sync::Arc;

use dashmap::DashMap;

use super::{AssetResolver, CollaboratorError, FungibleAsset};
use crate::types::AssetId;

/// Concurrent registry of deployed asset contracts.
#[derive(Default)]
pub struct AssetDirectory {
    assets: DashMap<AssetId, Arc<dyn FungibleAsset>>,
}

impl AssetDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys `asset` at its own id, replacing whatever was there.
    pub fn register(&self, asset: Arc<dyn FungibleAsset>) -> AssetId {
        let id = asset.id();
        self.assets.insert(id, asset);
        id
    }

    /// Removes the contract at `asset`, if any.
    pub fn unregister(&self, asset: &AssetId) -> bool {
        self.assets.remove(asset).is_some()
    }

    /// Returns `true` if a contract is deployed at `asset`.
    pub fn contains(&self, asset: &AssetId) -> bool {
        self.assets.contains_key(asset)
    }

    /// Number of deployed contracts.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns `true` if nothing is deployed.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetResolver for AssetDirectory {
    fn resolve(&self, asset: &AssetId) -> Result<Arc<dyn FungibleAsset>, CollaboratorError> {
        self.assets
            .get(asset)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CollaboratorError::new(format!("no asset contract at {asset}")))
    }
}

impl std::fmt::Debug for AssetDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetDirectory")
            .field("assets", &self.assets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::SimulatedToken;
    use crate::types::Address;

    #[test]
    fn register_and_resolve() {
        let directory = AssetDirectory::new();
        let token = Arc::new(SimulatedToken::new("Mock", "MOCK"));
        token.mint(&Address::derive("alice"), 7).unwrap();

        let id = directory.register(token.clone());
        assert!(directory.contains(&id));
        assert_eq!(directory.len(), 1);

        let resolved = directory.resolve(&id).unwrap();
        assert_eq!(resolved.id(), id);
        assert_eq!(resolved.balance_of(&Address::derive("alice")), 7);
    }

    #[test]
    fn unknown_asset_fails_to_resolve() {
        let directory = AssetDirectory::new();
        let missing = AssetId::derive("nothing-here");
        let err = directory.resolve(&missing).err().unwrap();
        assert!(err.message().starts_with("no asset contract at 0x"));
    }

    #[test]
    fn unregister_removes() {
        let directory = AssetDirectory::new();
        let id = directory.register(Arc::new(SimulatedToken::new("Mock", "MOCK")));
        assert!(directory.unregister(&id));
        assert!(!directory.unregister(&id));
        assert!(directory.is_empty());
    }
}
