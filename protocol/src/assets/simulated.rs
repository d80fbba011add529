//! In-memory asset contracts.
//!
//! [`SimulatedToken`] behaves like a plain fungible token: balances,
//! allowances, mint and burn, with the usual failure messages.
//! [`SimulatedWrappedNative`] layers native-currency wrapping on top of one,
//! keeping a reserve of the native currency it was paid and a payout book
//! of native currency it has sent back out.
//!
//! Every mutation computes its resulting balances before writing any of
//! them, so a failed call leaves the contract untouched.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{CollaboratorError, FungibleAsset, NativeWrapper};
use crate::types::{Address, Amount, AssetId};

/// Failure messages, kept identical across contracts.
pub mod messages {
    pub const INSUFFICIENT_BALANCE: &str = "transfer amount exceeds balance";
    pub const INSUFFICIENT_ALLOWANCE: &str = "insufficient allowance";
    pub const TRANSFER_TO_ZERO: &str = "transfer to the zero address";
    pub const MINT_TO_ZERO: &str = "mint to the zero address";
    pub const SUPPLY_OVERFLOW: &str = "total supply overflow";
    pub const BURN_EXCEEDS_BALANCE: &str = "burn amount exceeds balance";
    pub const RESERVE_EXHAUSTED: &str = "native reserve exhausted";
}

#[derive(Debug, Default)]
struct TokenBook {
    balances: HashMap<Address, Amount>,
    /// `(owner, spender) -> remaining allowance`
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

impl TokenBook {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CollaboratorError> {
        if to.is_zero() {
            return Err(CollaboratorError::new(messages::TRANSFER_TO_ZERO));
        }
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(CollaboratorError::new(messages::INSUFFICIENT_BALANCE));
        }
        if from == to {
            return Ok(());
        }
        // Balances are bounded by total supply, so this cannot overflow.
        let to_balance = self.balance(to) + amount;
        self.balances.insert(*from, from_balance - amount);
        self.balances.insert(*to, to_balance);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SimulatedToken
// ---------------------------------------------------------------------------

/// An in-memory fungible token.
#[derive(Debug)]
pub struct SimulatedToken {
    id: AssetId,
    name: String,
    symbol: String,
    book: RwLock<TokenBook>,
}

impl SimulatedToken {
    /// Creates a token whose id is derived from its name and symbol.
    pub fn new(name: &str, symbol: &str) -> Self {
        let id = AssetId::derive(&format!("token:{name}:{symbol}"));
        Self::with_id(id, name, symbol)
    }

    /// Creates a token deployed at a specific id.
    pub fn with_id(id: AssetId, name: &str, symbol: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            book: RwLock::new(TokenBook::default()),
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Current total supply.
    pub fn total_supply(&self) -> Amount {
        self.book.read().total_supply
    }

    /// Creates `amount` new units for `to`.
    pub fn mint(&self, to: &Address, amount: Amount) -> Result<(), CollaboratorError> {
        if to.is_zero() {
            return Err(CollaboratorError::new(messages::MINT_TO_ZERO));
        }
        let mut book = self.book.write();
        let supply = book
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| CollaboratorError::new(messages::SUPPLY_OVERFLOW))?;
        let balance = book.balance(to) + amount;
        book.total_supply = supply;
        book.balances.insert(*to, balance);
        Ok(())
    }

    /// Destroys `amount` units held by `from`.
    pub fn burn(&self, from: &Address, amount: Amount) -> Result<(), CollaboratorError> {
        let mut book = self.book.write();
        let balance = book.balance(from);
        if balance < amount {
            return Err(CollaboratorError::new(messages::BURN_EXCEEDS_BALANCE));
        }
        book.balances.insert(*from, balance - amount);
        book.total_supply -= amount;
        Ok(())
    }

    /// Sets `spender`'s allowance over `owner`'s balance.
    pub fn approve(&self, owner: &Address, spender: &Address, amount: Amount) {
        self.book.write().allowances.insert((*owner, *spender), amount);
    }

    /// Remaining allowance of `spender` over `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.book
            .read()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }
}

impl FungibleAsset for SimulatedToken {
    fn id(&self) -> AssetId {
        self.id
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.book.read().balance(account)
    }

    fn transfer(
        &self,
        sender: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CollaboratorError> {
        self.book.write().move_balance(sender, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CollaboratorError> {
        let mut book = self.book.write();
        let key = (*owner, *spender);
        let allowance = book.allowances.get(&key).copied().unwrap_or(0);
        if allowance < amount {
            return Err(CollaboratorError::new(messages::INSUFFICIENT_ALLOWANCE));
        }
        book.move_balance(owner, to, amount)?;
        book.allowances.insert(key, allowance - amount);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SimulatedWrappedNative
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct NativeBook {
    /// Native currency backing the outstanding wrapped supply.
    reserve: Amount,
    /// Native currency paid out by `unwrap_to`, per recipient.
    payouts: HashMap<Address, Amount>,
}

/// An in-memory native-currency wrapper.
///
/// Wrapped units are an ordinary [`SimulatedToken`], so the wrapper can be
/// registered in an asset directory like any other asset.
#[derive(Debug)]
pub struct SimulatedWrappedNative {
    token: SimulatedToken,
    native: RwLock<NativeBook>,
}

impl SimulatedWrappedNative {
    /// Creates a wrapper with a deterministic id.
    pub fn new() -> Self {
        Self {
            token: SimulatedToken::new("Wrapped Native", "WNATIVE"),
            native: RwLock::new(NativeBook::default()),
        }
    }

    /// The wrapped-unit token.
    pub fn token(&self) -> &SimulatedToken {
        &self.token
    }

    /// Native currency currently held as backing.
    pub fn reserve(&self) -> Amount {
        self.native.read().reserve
    }

    /// Native currency paid out to `account` so far.
    pub fn native_balance_of(&self, account: &Address) -> Amount {
        self.native
            .read()
            .payouts
            .get(account)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for SimulatedWrappedNative {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeWrapper for SimulatedWrappedNative {
    fn id(&self) -> AssetId {
        self.token.id()
    }

    fn balance_of(&self, account: &Address) -> Amount {
        FungibleAsset::balance_of(&self.token, account)
    }

    fn wrap(&self, depositor: &Address, value: Amount) -> Result<Amount, CollaboratorError> {
        let mut native = self.native.write();
        let reserve = native
            .reserve
            .checked_add(value)
            .ok_or_else(|| CollaboratorError::new(messages::SUPPLY_OVERFLOW))?;
        self.token.mint(depositor, value)?;
        native.reserve = reserve;
        Ok(value)
    }

    fn unwrap_to(
        &self,
        holder: &Address,
        amount: Amount,
        recipient: &Address,
    ) -> Result<Amount, CollaboratorError> {
        let mut native = self.native.write();
        if native.reserve < amount {
            return Err(CollaboratorError::new(messages::RESERVE_EXHAUSTED));
        }
        self.token.burn(holder, amount)?;
        native.reserve -= amount;
        *native.payouts.entry(*recipient).or_insert(0) += amount;
        Ok(amount)
    }
}

impl FungibleAsset for SimulatedWrappedNative {
    fn id(&self) -> AssetId {
        self.token.id()
    }

    fn balance_of(&self, account: &Address) -> Amount {
        FungibleAsset::balance_of(&self.token, account)
    }

    fn transfer(
        &self,
        sender: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CollaboratorError> {
        self.token.transfer(sender, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CollaboratorError> {
        self.token.transfer_from(spender, owner, to, amount)
    }
}
