// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # GameVault Protocol Core Library
//!
//! Shared vocabulary for the GameVault custody ledger: who is calling, which
//! asset is being moved, how much of it, and which external contract
//! actually holds the tokens.
//!
//! ## Architecture
//!
//! - **types**: `Address`, `AssetId`, `Amount`, `CallContext`.
//! - **config**: Protocol constants and the `VaultConfig` a vault is built from.
//! - **assets**: Collaborator traits (token transfer, native wrapping,
//!   asset lookup) plus in-memory implementations.
//! - **logging**: `tracing` subscriber setup.
//!
//! ## Design Philosophy
//!
//! 1. Amounts are `u128` in smallest units. No floats, no silent wrapping.
//! 2. Null identifiers are representable but never accepted where a real
//!    party or asset is required.
//! 3. If it touches money, it has tests. Plural.

pub mod assets;
pub mod config;
pub mod logging;
pub mod types;

pub use types::{Address, AddressError, Amount, AssetId, CallContext};
