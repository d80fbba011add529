//! # Protocol Configuration & Constants
//!
//! Every magic number in GameVault lives here, together with the
//! [`VaultConfig`] a vault is constructed from.
//!
//! The fee rate is a numerator/denominator pair applied with integer
//! multiply-then-divide. `3 / 1000` means a 0.3% cut of every internal
//! transfer while fees are switched on.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Crate-independent protocol version, reported in snapshots.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Length of an account or contract address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Fee Parameters
// ---------------------------------------------------------------------------

/// Default fee numerator.
pub const DEFAULT_FEE_NUMERATOR: u128 = 3;

/// Default fee denominator. Together with the numerator: 0.3%.
pub const DEFAULT_FEE_DENOMINATOR: u128 = 1_000;

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Decimal places of the reference tokens (and of wrapped native currency).
pub const TOKEN_DECIMALS: u32 = 18;

/// One whole token in smallest units (`10^18`).
pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

// ---------------------------------------------------------------------------
// VaultConfig
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`VaultConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON for [`VaultConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but violates a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Construction-time parameters of a vault.
///
/// Missing fields fall back to the defaults above, so `{}` is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Fee numerator.
    pub fee_numerator: u128,
    /// Fee denominator. Must be non-zero.
    pub fee_denominator: u128,
    /// Whether transfers start out fee-bearing.
    pub fee_on: bool,
    /// When set, re-adding an already allowed asset is an error instead of
    /// a silent success.
    pub strict_asset_listing: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            fee_numerator: DEFAULT_FEE_NUMERATOR,
            fee_denominator: DEFAULT_FEE_DENOMINATOR,
            fee_on: false,
            strict_asset_listing: false,
        }
    }
}

impl VaultConfig {
    /// Checks the fee rate.
    ///
    /// A zero denominator would divide by zero and a numerator above the
    /// denominator would take more than the transferred amount.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fee_denominator == 0 {
            return Err(ConfigError::Invalid(
                "fee_denominator must be greater than zero".into(),
            ));
        }
        if self.fee_numerator > self.fee_denominator {
            return Err(ConfigError::Invalid(format!(
                "fee_numerator ({}) exceeds fee_denominator ({})",
                self.fee_numerator, self.fee_denominator
            )));
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: VaultConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
