//! # GameVault
//!
//! The custody facade. Players deposit allow-listed assets (or native
//! currency, which is wrapped on the way in), the controller moves balances
//! between accounts with an optional fee, and players withdraw what they
//! own.
//!
//! ## Call ordering
//!
//! Tokens live in external contracts, and those contracts may call back
//! into the vault. Two rules keep that safe:
//!
//! 1. The state lock is never held while a collaborator runs.
//! 2. Outbound movements debit the ledger *before* the external call;
//!    inbound movements credit only *after* the external call succeeded.
//!
//! A collaborator that re-enters during a withdrawal therefore sees the
//! already reduced balance. If the external call fails, the ledger change is
//! reverted and the collaborator's message is returned unchanged.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use gamevault_protocol::assets::{AssetResolver, CollaboratorError, NativeWrapper};
use gamevault_protocol::config::{ConfigError, VaultConfig};
use gamevault_protocol::{Address, Amount, AssetId, CallContext};

use crate::access::{AccessControl, AccessError};
use crate::events::{EventJournal, EventRecord, VaultEvent};
use crate::fees::{FeeError, FeePolicy, FeeQuote};
use crate::ledger::{Ledger, LedgerError};
use crate::registry::{AssetRegistry, RegistryError};
use crate::snapshot::SnapshotError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by vault operations. Every error leaves the vault as it
/// was before the call.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Money-moving calls require a strictly positive amount.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// The null address was supplied where a real account is required.
    #[error("account is the null address")]
    InvalidAccount,

    /// Native currency was attached to a call that does not accept it.
    #[error("call does not accept native value")]
    NonPayable,

    /// Deposit of an asset that is not on the allow-list.
    #[error("asset {0} is not allowed")]
    AssetNotAllowed(AssetId),

    /// The vault was built without a native currency wrapper.
    #[error("native currency wrapper is not configured")]
    NativeNotConfigured,

    /// An external asset contract refused the call.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// Allow-list maintenance failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A balance operation failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Fee computation or booking failed.
    #[error("fee error: {0}")]
    Fee(#[from] FeeError),

    /// The caller lacks the required role.
    #[error("access error: {0}")]
    Access(#[from] AccessError),

    /// The vault configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A snapshot could not be restored.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

// ---------------------------------------------------------------------------
// Custody report
// ---------------------------------------------------------------------------

/// Reconciliation of one asset's liabilities against what the vault holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyReport {
    pub asset: AssetId,
    /// Sum of all account balances.
    pub ledger_total: Amount,
    /// Accrued transfer fees.
    pub fee_pool: Amount,
    /// Deposited minus withdrawn.
    pub net_inflow: Amount,
    /// Vault balance reported by the asset contract, if it could be reached.
    pub held_externally: Option<Amount>,
}

impl CustodyReport {
    /// `ledger_total + fee_pool == net_inflow`.
    pub fn is_conserved(&self) -> bool {
        self.ledger_total.checked_add(self.fee_pool) == Some(self.net_inflow)
    }

    /// The asset contract reports at least as much as the vault owes.
    pub fn is_backed(&self) -> bool {
        self.held_externally
            .map_or(false, |held| held >= self.net_inflow)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything the vault mutates, guarded by one lock.
#[derive(Debug, Clone)]
pub(crate) struct VaultState {
    pub(crate) registry: AssetRegistry,
    pub(crate) ledger: Ledger,
    pub(crate) fees: FeePolicy,
    pub(crate) access: AccessControl,
    pub(crate) journal: EventJournal,
}

struct VaultInner {
    address: Address,
    assets: Arc<dyn AssetResolver>,
    native: Option<Arc<dyn NativeWrapper>>,
    state: Mutex<VaultState>,
}

/// Shared handle to a vault. Clones refer to the same vault.
#[derive(Clone)]
pub struct GameVault {
    inner: Arc<VaultInner>,
}

impl std::fmt::Debug for GameVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameVault")
            .field("address", &self.inner.address)
            .field("wrapped_asset", &self.wrapped_asset())
            .finish_non_exhaustive()
    }
}

impl GameVault {
    /// Creates a vault in custody of `address`, administered by
    /// `controller`.
    ///
    /// `assets` resolves asset identifiers to their contracts. `native`,
    /// when given, enables [`deposit_native`](Self::deposit_native) and
    /// [`withdraw_native`](Self::withdraw_native) for the asset it wraps.
    ///
    /// # Errors
    ///
    /// - [`VaultError::InvalidAccount`] if `address` is null.
    /// - [`AccessError::InvalidController`] if `controller` is null.
    /// - [`RegistryError::InvalidAsset`] if the wrapper reports the null asset.
    /// - [`VaultError::Config`] if the fee rate is unusable.
    pub fn new(
        address: Address,
        controller: Address,
        config: &VaultConfig,
        assets: Arc<dyn AssetResolver>,
        native: Option<Arc<dyn NativeWrapper>>,
    ) -> Result<Self, VaultError> {
        config.validate()?;
        let state = VaultState {
            registry: AssetRegistry::new(config.strict_asset_listing),
            ledger: Ledger::new(),
            fees: FeePolicy::from_config(config)?,
            access: AccessControl::new(controller)?,
            journal: EventJournal::new(),
        };
        let vault = Self::assemble(address, assets, native, state)?;
        info!(
            vault = %address,
            %controller,
            fee_on = config.fee_on,
            native = vault.inner.native.is_some(),
            "vault created"
        );
        Ok(vault)
    }

    pub(crate) fn assemble(
        address: Address,
        assets: Arc<dyn AssetResolver>,
        native: Option<Arc<dyn NativeWrapper>>,
        state: VaultState,
    ) -> Result<Self, VaultError> {
        if address.is_zero() {
            return Err(VaultError::InvalidAccount);
        }
        if native.as_ref().map_or(false, |n| n.id().is_null()) {
            return Err(RegistryError::InvalidAsset.into());
        }
        Ok(Self {
            inner: Arc::new(VaultInner {
                address,
                assets,
                native,
                state: Mutex::new(state),
            }),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, VaultState> {
        self.inner.state.lock()
    }

    // -----------------------------------------------------------------------
    // Deposits
    // -----------------------------------------------------------------------

    /// Pulls `amount` of `asset` from the caller into custody and credits
    /// the caller. Returns the caller's new balance.
    ///
    /// The caller must have approved the vault to spend `amount` on the
    /// asset contract beforehand.
    pub fn deposit(
        &self,
        ctx: &CallContext,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Amount, VaultError> {
        ensure_non_payable(ctx)?;
        ensure_positive(amount)?;
        if !self.lock().registry.is_allowed(&asset) {
            debug!(%asset, account = %ctx.sender, "deposit rejected: asset not allowed");
            return Err(VaultError::AssetNotAllowed(asset));
        }

        let token = self.inner.assets.resolve(&asset)?;
        let vault = self.inner.address;
        token.transfer_from(&vault, &ctx.sender, &vault, amount)?;

        let mut state = self.lock();
        match state.ledger.record_deposit(asset, ctx.sender, amount) {
            Ok(balance) => {
                state.journal.record(VaultEvent::Deposited {
                    asset,
                    account: ctx.sender,
                    amount,
                });
                drop(state);
                info!(%asset, account = %ctx.sender, amount = %amount, "deposit");
                Ok(balance)
            }
            Err(err) => {
                drop(state);
                warn!(%asset, account = %ctx.sender, amount = %amount, %err, "deposit credit failed, returning tokens");
                if let Err(refund) = token.transfer(&vault, &ctx.sender, amount) {
                    error!(%asset, account = %ctx.sender, amount = %amount, %refund, "deposit refund failed");
                }
                Err(err.into())
            }
        }
    }

    /// Wraps the native currency attached to the call and credits the
    /// wrapped asset to the caller. Returns the caller's new balance.
    pub fn deposit_native(&self, ctx: &CallContext) -> Result<Amount, VaultError> {
        let native = self.native()?;
        ensure_positive(ctx.value)?;

        let asset = native.id();
        let vault = self.inner.address;
        let wrapped = native.wrap(&vault, ctx.value)?;

        let mut state = self.lock();
        match state.ledger.record_deposit(asset, ctx.sender, wrapped) {
            Ok(balance) => {
                state.journal.record(VaultEvent::NativeDeposited {
                    asset,
                    account: ctx.sender,
                    amount: wrapped,
                });
                drop(state);
                info!(%asset, account = %ctx.sender, amount = %wrapped, "native deposit");
                Ok(balance)
            }
            Err(err) => {
                drop(state);
                warn!(%asset, account = %ctx.sender, amount = %wrapped, %err, "native credit failed, unwrapping");
                if let Err(refund) = native.unwrap_to(&vault, wrapped, &ctx.sender) {
                    error!(%asset, account = %ctx.sender, amount = %wrapped, %refund, "native refund failed");
                }
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Withdrawals
    // -----------------------------------------------------------------------

    /// Pays `amount` of `asset` out of the caller's own balance. Returns the
    /// caller's remaining balance.
    ///
    /// Withdrawals ignore the allow-list.
    pub fn withdraw(
        &self,
        ctx: &CallContext,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Amount, VaultError> {
        ensure_non_payable(ctx)?;
        ensure_positive(amount)?;
        let token = self.inner.assets.resolve(&asset)?;

        let remaining = self
            .lock()
            .ledger
            .record_withdrawal(asset, ctx.sender, amount)?;

        let vault = self.inner.address;
        if let Err(err) = token.transfer(&vault, &ctx.sender, amount) {
            warn!(%asset, account = %ctx.sender, amount = %amount, %err, "withdrawal push failed, reverting");
            self.revert_withdrawal(asset, ctx.sender, amount);
            return Err(err.into());
        }

        self.lock().journal.record(VaultEvent::Withdrawn {
            asset,
            account: ctx.sender,
            amount,
        });
        info!(%asset, account = %ctx.sender, amount = %amount, "withdrawal");
        Ok(remaining)
    }

    /// Pays `amount` of the wrapped asset out of the caller's balance as
    /// native currency. Returns the caller's remaining wrapped balance.
    pub fn withdraw_native(&self, ctx: &CallContext, amount: Amount) -> Result<Amount, VaultError> {
        ensure_non_payable(ctx)?;
        let native = self.native()?;
        ensure_positive(amount)?;

        let asset = native.id();
        let remaining = self
            .lock()
            .ledger
            .record_withdrawal(asset, ctx.sender, amount)?;

        let vault = self.inner.address;
        if let Err(err) = native.unwrap_to(&vault, amount, &ctx.sender) {
            warn!(%asset, account = %ctx.sender, amount = %amount, %err, "unwrap failed, reverting");
            self.revert_withdrawal(asset, ctx.sender, amount);
            return Err(err.into());
        }

        self.lock().journal.record(VaultEvent::NativeWithdrawn {
            asset,
            account: ctx.sender,
            amount,
        });
        info!(%asset, account = %ctx.sender, amount = %amount, "native withdrawal");
        Ok(remaining)
    }

    fn revert_withdrawal(&self, asset: AssetId, account: Address, amount: Amount) {
        if let Err(err) = self.lock().ledger.record_deposit(asset, account, amount) {
            error!(%asset, %account, amount = %amount, %err, "failed to restore withdrawn balance");
        }
    }

    // -----------------------------------------------------------------------
    // Internal transfers
    // -----------------------------------------------------------------------

    /// Moves `amount` of `asset` from `from` to `to`, taking the transfer fee
    /// when the fee switch is on. Controller only.
    ///
    /// Returns the breakdown that was booked. No tokens leave custody.
    pub fn transfer_account_asset(
        &self,
        ctx: &CallContext,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<FeeQuote, VaultError> {
        ensure_non_payable(ctx)?;
        let mut state = self.lock();
        state.access.require_controller(&ctx.sender)?;
        ensure_positive(amount)?;
        if to.is_zero() {
            return Err(VaultError::InvalidAccount);
        }

        let quote = state.fees.quote(asset, amount)?;
        state
            .ledger
            .transfer(asset, from, to, quote.gross, quote.net)?;
        state.fees.commit(&quote);
        state.journal.record(VaultEvent::Transferred {
            asset,
            from,
            to,
            amount,
            net: quote.net,
            fee: quote.fee,
        });
        drop(state);

        info!(%asset, %from, %to, amount = %amount, fee = %quote.fee, "transfer");
        Ok(quote)
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Puts `asset` on the allow-list. Controller only.
    pub fn add_asset(&self, ctx: &CallContext, asset: AssetId) -> Result<(), VaultError> {
        ensure_non_payable(ctx)?;
        let mut state = self.lock();
        state.access.require_controller(&ctx.sender)?;
        if state.registry.add(asset)? {
            state.journal.record(VaultEvent::AssetAdded { asset });
            info!(%asset, "asset added");
        }
        Ok(())
    }

    /// Takes `asset` off the allow-list. Existing balances stay
    /// withdrawable. Controller only.
    pub fn remove_asset(&self, ctx: &CallContext, asset: AssetId) -> Result<(), VaultError> {
        ensure_non_payable(ctx)?;
        let mut state = self.lock();
        state.access.require_controller(&ctx.sender)?;
        state.registry.remove(asset)?;
        state.journal.record(VaultEvent::AssetRemoved { asset });
        info!(%asset, "asset removed");
        Ok(())
    }

    /// Turns the transfer fee on or off. Controller only.
    pub fn set_fee_on(&self, ctx: &CallContext, on: bool) -> Result<(), VaultError> {
        ensure_non_payable(ctx)?;
        let mut state = self.lock();
        state.access.require_controller(&ctx.sender)?;
        state.fees.set_fee_on(on);
        state.journal.record(VaultEvent::FeeSwitched { fee_on: on });
        info!(fee_on = on, "fee switch");
        Ok(())
    }

    /// Hands the controller role to `new_controller`. Controller only.
    pub fn set_controller(
        &self,
        ctx: &CallContext,
        new_controller: Address,
    ) -> Result<(), VaultError> {
        ensure_non_payable(ctx)?;
        let mut state = self.lock();
        let previous = state.access.set_controller(&ctx.sender, new_controller)?;
        state.journal.record(VaultEvent::ControllerChanged {
            previous,
            current: new_controller,
        });
        info!(%previous, current = %new_controller, "controller changed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Whether `asset` is on the allow-list.
    pub fn get_asset(&self, asset: &AssetId) -> bool {
        self.lock().registry.is_allowed(asset)
    }

    /// Balance of `account` in `asset`.
    pub fn get_account_asset(&self, asset: &AssetId, account: &Address) -> Amount {
        self.lock().ledger.balance_of(asset, account)
    }

    /// Fees accrued for `asset`.
    pub fn get_asset_fees(&self, asset: &AssetId) -> Amount {
        self.lock().fees.pool_of(asset)
    }

    pub fn fee_on(&self) -> bool {
        self.lock().fees.fee_on()
    }

    pub fn controller(&self) -> Address {
        self.lock().access.controller()
    }

    /// Fee numerator.
    pub fn fee(&self) -> u128 {
        self.lock().fees.numerator()
    }

    pub fn fee_denominator(&self) -> u128 {
        self.lock().fees.denominator()
    }

    /// The asset produced by the native wrapper, if one is configured.
    pub fn wrapped_asset(&self) -> Option<AssetId> {
        self.inner.native.as_ref().map(|n| n.id())
    }

    /// The custody address tokens are held at.
    pub fn address(&self) -> Address {
        self.inner.address
    }

    pub fn allowed_assets(&self) -> Vec<AssetId> {
        self.lock().registry.allowed()
    }

    /// Every journal entry, oldest first.
    pub fn events(&self) -> Vec<EventRecord> {
        self.lock().journal.records().to_vec()
    }

    /// Journal entries after sequence number `seq`.
    pub fn events_since(&self, seq: u64) -> Vec<EventRecord> {
        self.lock().journal.since(seq).to_vec()
    }

    /// Reconciles `asset`'s books with the balance its contract reports for
    /// the vault.
    pub fn custody_report(&self, asset: &AssetId) -> CustodyReport {
        let (ledger_total, fee_pool, net_inflow) = {
            let state = self.lock();
            (
                state.ledger.total_of(asset),
                state.fees.pool_of(asset),
                state.ledger.net_inflow_of(asset),
            )
        };

        let vault = self.inner.address;
        let held_externally = match &self.inner.native {
            Some(native) if native.id() == *asset => Some(native.balance_of(&vault)),
            _ => self
                .inner
                .assets
                .resolve(asset)
                .ok()
                .map(|token| token.balance_of(&vault)),
        };

        CustodyReport {
            asset: *asset,
            ledger_total,
            fee_pool,
            net_inflow,
            held_externally,
        }
    }

    fn native(&self) -> Result<&Arc<dyn NativeWrapper>, VaultError> {
        self.inner
            .native
            .as_ref()
            .ok_or(VaultError::NativeNotConfigured)
    }
}

fn ensure_positive(amount: Amount) -> Result<(), VaultError> {
    if amount == 0 {
        return Err(VaultError::InvalidAmount);
    }
    Ok(())
}

fn ensure_non_payable(ctx: &CallContext) -> Result<(), VaultError> {
    if ctx.value != 0 {
        return Err(VaultError::NonPayable);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gamevault_protocol::assets::{
        AssetDirectory, FungibleAsset, SimulatedToken, SimulatedWrappedNative,
    };

    struct Fixture {
        vault: GameVault,
        token: Arc<SimulatedToken>,
        native: Arc<SimulatedWrappedNative>,
    }

    fn controller() -> CallContext {
        CallContext::new(Address::derive("controller"))
    }

    fn player() -> CallContext {
        CallContext::new(Address::derive("player1"))
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(AssetDirectory::new());
        let token = Arc::new(SimulatedToken::new("Mock", "MOCK"));
        let native = Arc::new(SimulatedWrappedNative::new());
        directory.register(token.clone());
        directory.register(native.clone());

        let wrapper: Arc<dyn NativeWrapper> = native.clone();
        let vault = GameVault::new(
            Address::derive("vault"),
            controller().sender,
            &VaultConfig::default(),
            directory,
            Some(wrapper),
        )
        .unwrap();
        vault.add_asset(&controller(), token.id()).unwrap();

        token.mint(&player().sender, 1_000).unwrap();
        token.approve(&player().sender, &vault.address(), 1_000);
        Fixture {
            vault,
            token,
            native,
        }
    }

    #[test]
    fn construction_rejects_null_parties() {
        let directory: Arc<dyn AssetResolver> = Arc::new(AssetDirectory::new());
        let config = VaultConfig::default();

        let err = GameVault::new(Address::ZERO, controller().sender, &config, directory.clone(), None)
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidAccount));

        let err = GameVault::new(Address::derive("vault"), Address::ZERO, &config, directory, None)
            .unwrap_err();
        assert!(matches!(err, VaultError::Access(AccessError::InvalidController)));
    }

    #[test]
    fn construction_rejects_bad_fee_rate() {
        let config = VaultConfig {
            fee_denominator: 0,
            ..VaultConfig::default()
        };
        let err = GameVault::new(
            Address::derive("vault"),
            controller().sender,
            &config,
            Arc::new(AssetDirectory::new()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn deposit_credits_after_pull() {
        let f = fixture();
        let asset = f.token.id();
        let balance = f.vault.deposit(&player(), asset, 400).unwrap();

        assert_eq!(balance, 400);
        assert_eq!(f.token.balance_of(&player().sender), 600);
        assert_eq!(f.token.balance_of(&f.vault.address()), 400);
        assert!(f.vault.custody_report(&asset).is_conserved());
    }

    #[test]
    fn deposit_requires_allowance() {
        let f = fixture();
        f.token.approve(&player().sender, &f.vault.address(), 0);
        let err = f.vault.deposit(&player(), f.token.id(), 1).unwrap_err();
        assert_eq!(err.to_string(), "insufficient allowance");
        assert_eq!(f.vault.get_account_asset(&f.token.id(), &player().sender), 0);
    }

    #[test]
    fn zero_amounts_rejected_everywhere() {
        let f = fixture();
        let asset = f.token.id();
        assert!(matches!(f.vault.deposit(&player(), asset, 0), Err(VaultError::InvalidAmount)));
        assert!(matches!(f.vault.withdraw(&player(), asset, 0), Err(VaultError::InvalidAmount)));
        assert!(matches!(f.vault.deposit_native(&player()), Err(VaultError::InvalidAmount)));
        assert!(matches!(f.vault.withdraw_native(&player(), 0), Err(VaultError::InvalidAmount)));
        assert!(matches!(
            f.vault.transfer_account_asset(&controller(), asset, player().sender, controller().sender, 0),
            Err(VaultError::InvalidAmount)
        ));
        assert!(f.vault.events().iter().all(|r| !matches!(r.event, VaultEvent::Deposited { .. })));
    }

    #[test]
    fn value_on_non_payable_call_rejected() {
        let f = fixture();
        let paying = player().with_value(5);
        assert!(matches!(
            f.vault.deposit(&paying, f.token.id(), 10),
            Err(VaultError::NonPayable)
        ));
        assert!(matches!(
            f.vault.set_fee_on(&controller().with_value(1), true),
            Err(VaultError::NonPayable)
        ));
    }

    #[test]
    fn transfer_to_null_account_rejected() {
        let f = fixture();
        f.vault.deposit(&player(), f.token.id(), 100).unwrap();
        let err = f
            .vault
            .transfer_account_asset(&controller(), f.token.id(), player().sender, Address::ZERO, 10)
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidAccount));
        assert_eq!(f.vault.get_account_asset(&f.token.id(), &player().sender), 100);
    }

    #[test]
    fn failed_push_reverts_withdrawal() {
        let f = fixture();
        let asset = f.token.id();
        f.vault.deposit(&player(), asset, 500).unwrap();
        // Drain the vault's real holding behind its back.
        f.token.burn(&f.vault.address(), 500).unwrap();

        let err = f.vault.withdraw(&player(), asset, 200).unwrap_err();
        assert!(matches!(err, VaultError::Collaborator(_)));
        assert_eq!(f.vault.get_account_asset(&asset, &player().sender), 500);

        let report = f.vault.custody_report(&asset);
        assert!(report.is_conserved());
        assert!(!report.is_backed());
    }

    #[test]
    fn native_roundtrip() {
        let f = fixture();
        let wrapped = NativeWrapper::id(f.native.as_ref());
        assert_eq!(f.vault.wrapped_asset(), Some(wrapped));

        let balance = f.vault.deposit_native(&player().with_value(250)).unwrap();
        assert_eq!(balance, 250);
        assert_eq!(f.native.reserve(), 250);

        let remaining = f.vault.withdraw_native(&player(), 100).unwrap();
        assert_eq!(remaining, 150);
        assert_eq!(f.native.native_balance_of(&player().sender), 100);

        let report = f.vault.custody_report(&wrapped);
        assert_eq!(report.held_externally, Some(150));
        assert!(report.is_conserved() && report.is_backed());
    }

    #[test]
    fn native_requires_wrapper() {
        let vault = GameVault::new(
            Address::derive("vault"),
            controller().sender,
            &VaultConfig::default(),
            Arc::new(AssetDirectory::new()),
            None,
        )
        .unwrap();
        assert!(matches!(
            vault.deposit_native(&player().with_value(1)),
            Err(VaultError::NativeNotConfigured)
        ));
        assert!(matches!(
            vault.withdraw_native(&player(), 1),
            Err(VaultError::NativeNotConfigured)
        ));
        assert_eq!(vault.wrapped_asset(), None);
    }

    #[test]
    fn rejected_calls_leave_no_events() {
        let f = fixture();
        let before = f.vault.events().len();
        let _ = f.vault.add_asset(&player(), AssetId::derive("X"));
        let _ = f.vault.withdraw(&player(), f.token.id(), 1);
        let _ = f.vault.remove_asset(&controller(), AssetId::derive("never-added"));
        assert_eq!(f.vault.events().len(), before);
    }

    #[test]
    fn custody_report_of_unknown_asset() {
        let f = fixture();
        let report = f.vault.custody_report(&AssetId::derive("nowhere"));
        assert_eq!(report.held_externally, None);
        assert!(report.is_conserved());
        assert!(!report.is_backed());
    }
}
