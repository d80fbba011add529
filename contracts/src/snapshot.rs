//! Point-in-time image of a vault's state.
//!
//! A snapshot carries the ledger, fee pools, allow-list, controller and
//! journal. Collaborators are not part of it: [`GameVault::restore`] takes
//! them again, and refuses a native wrapper that produces a different asset
//! than the one the snapshot was taken with.
//!
//! Two encodings are provided: compact binary (`bincode`) for persistence
//! and JSON for inspection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use gamevault_protocol::assets::{AssetResolver, NativeWrapper};
use gamevault_protocol::config::PROTOCOL_VERSION;
use gamevault_protocol::{Address, AssetId};

use crate::access::{AccessControl, AccessError};
use crate::events::EventJournal;
use crate::fees::FeePolicy;
use crate::ledger::Ledger;
use crate::registry::AssetRegistry;
use crate::vault::{GameVault, VaultError, VaultState};

/// Errors produced while encoding, decoding or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("binary encoding failed: {0}")]
    Encode(bincode::Error),

    #[error("binary decoding failed: {0}")]
    Decode(bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot does not fit the collaborators it is restored with.
    #[error("snapshot mismatch: {0}")]
    Mismatch(String),

    /// The snapshot's books contradict themselves.
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
}

/// Serializable image of a [`GameVault`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// Protocol version that wrote the snapshot.
    pub version: String,
    pub taken_at: DateTime<Utc>,
    pub address: Address,
    /// Asset produced by the native wrapper, if the vault had one.
    pub wrapped_asset: Option<AssetId>,
    pub registry: AssetRegistry,
    pub ledger: Ledger,
    pub fees: FeePolicy,
    pub access: AccessControl,
    pub journal: EventJournal,
}

impl VaultSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(SnapshotError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(SnapshotError::Decode)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl GameVault {
    /// Captures the vault's current state.
    pub fn snapshot(&self) -> VaultSnapshot {
        let state = self.lock().clone();
        VaultSnapshot {
            version: PROTOCOL_VERSION.to_string(),
            taken_at: Utc::now(),
            address: self.address(),
            wrapped_asset: self.wrapped_asset(),
            registry: state.registry,
            ledger: state.ledger,
            fees: state.fees,
            access: state.access,
            journal: state.journal,
        }
    }

    /// Rebuilds a vault from `snapshot`, wired to the given collaborators.
    ///
    /// # Errors
    ///
    /// - [`SnapshotError::Mismatch`] if `native` does not produce the
    ///   snapshot's wrapped asset (or one side has no wrapper).
    /// - [`SnapshotError::Inconsistent`] if a stored total disagrees with
    ///   the balances, or `total + fee pool != net inflow` for some asset.
    /// - [`VaultError::Fee`] or [`VaultError::Access`] if the decoded fee
    ///   rate or controller is invalid.
    pub fn restore(
        snapshot: VaultSnapshot,
        assets: Arc<dyn AssetResolver>,
        native: Option<Arc<dyn NativeWrapper>>,
    ) -> Result<Self, VaultError> {
        let wrapped = native.as_ref().map(|n| n.id());
        if wrapped != snapshot.wrapped_asset {
            return Err(SnapshotError::Mismatch(format!(
                "snapshot wraps {:?}, wrapper provides {:?}",
                snapshot.wrapped_asset, wrapped
            ))
            .into());
        }
        snapshot.fees.validate()?;
        if snapshot.access.controller().is_zero() {
            return Err(AccessError::InvalidController.into());
        }
        check_books(&snapshot.ledger, &snapshot.fees)?;

        let state = VaultState {
            registry: snapshot.registry,
            ledger: snapshot.ledger,
            fees: snapshot.fees,
            access: snapshot.access,
            journal: snapshot.journal,
        };
        let vault = GameVault::assemble(snapshot.address, assets, native, state)?;
        info!(
            vault = %snapshot.address,
            version = %snapshot.version,
            taken_at = %snapshot.taken_at,
            "vault restored"
        );
        Ok(vault)
    }
}

fn check_books(ledger: &Ledger, fees: &FeePolicy) -> Result<(), SnapshotError> {
    ledger.audit().map_err(SnapshotError::Inconsistent)?;

    let mut assets = ledger.assets();
    assets.extend(fees.pooled_assets());
    for asset in assets {
        let booked = ledger.total_of(&asset).checked_add(fees.pool_of(&asset));
        let inflow = ledger.net_inflow_of(&asset);
        if booked != Some(inflow) {
            return Err(SnapshotError::Inconsistent(format!(
                "{asset}: balances plus fee pool do not match net inflow {inflow}"
            )));
        }
    }
    Ok(())
}
