//! # GameVault Contracts
//!
//! Custody logic for in-game assets. Players deposit fungible tokens (or
//! native currency, wrapped on the way in) into a shared vault; a single
//! controller moves balances between player accounts, optionally skimming a
//! proportional fee; players withdraw what they own.
//!
//! - **registry**: allow-list of depositable assets.
//! - **ledger**: per-asset, per-account balances plus custody aggregates.
//! - **fees**: fee switch, fee rate and per-asset fee pools.
//! - **access**: the controller role.
//! - **events**: append-only journal of committed changes.
//! - **vault**: the `GameVault` facade tying the above to external asset
//!   contracts.
//! - **snapshot**: persistable image of a vault.
//!
//! ## Design Principles
//!
//! 1. Every balance change is checked: `checked_add` / `checked_sub`, never
//!    wrapping, never clamping.
//! 2. For every asset, account balances plus the fee pool equal what was
//!    deposited minus what was withdrawn.
//! 3. An operation either commits fully or leaves no trace, including in the
//!    event journal.
//! 4. Ledger debits precede outbound token movements, so a token contract
//!    calling back into the vault sees the reduced balance.

pub mod access;
pub mod events;
pub mod fees;
pub mod ledger;
pub mod registry;
pub mod snapshot;
pub mod vault;

pub use access::{AccessControl, AccessError};
pub use events::{EventJournal, EventRecord, VaultEvent};
pub use fees::{FeeError, FeePolicy, FeeQuote};
pub use ledger::{Ledger, LedgerError};
pub use registry::{AssetRegistry, RegistryError};
pub use snapshot::{SnapshotError, VaultSnapshot};
pub use vault::{CustodyReport, GameVault, VaultError};
