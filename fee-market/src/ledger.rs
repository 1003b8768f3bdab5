//! Balance-keeping collaborator consumed by settlement.
//!
//! The fee market never owns balances: it asks a [`Ledger`] to move coins
//! between accounts. [`InMemoryLedger`] is a complete implementation suitable
//! for hosts without their own bank; [`MockLedger`] records every call for
//! tests.

#[cfg(any(test, feature = "dev-context-only-utils"))]
use std::{
    cell::RefCell,
    sync::atomic::{AtomicU64, Ordering},
};
use {
    crate::coin::Coin,
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::{collections::HashMap, fmt},
    thiserror::Error,
};

/// 32-byte account identifier, displayed in base58.
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Address([u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Distinct address per call, for tests.
    #[cfg(any(test, feature = "dev-context-only-utils"))]
    pub fn new_unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&id.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// Holder of a balance: a user address or a named module account.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize,
    BorshDeserialize,
)]
pub enum Account {
    User(Address),
    Module(String),
}

impl Account {
    pub fn module(name: impl Into<String>) -> Self {
        Self::Module(name.into())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(address) => write!(f, "{address}"),
            Self::Module(name) => write!(f, "module:{name}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {account} holds {available}{denom}, needs {required}{denom}")]
    InsufficientFunds {
        account: String,
        denom: String,
        available: u128,
        required: u128,
    },

    #[error("balance overflow")]
    Overflow,
}

pub trait Ledger {
    fn balance(&self, account: &Account, denom: &str) -> u128;

    /// Withdraw `coin` from `payer` into the fee `collector`.
    fn deduct(&mut self, payer: &Account, collector: &Account, coin: &Coin)
        -> Result<(), LedgerError>;

    fn transfer(&mut self, from: &Account, to: &Account, coin: &Coin) -> Result<(), LedgerError>;
}

/// Hash-map backed ledger. Either a transfer moves the full amount or it
/// leaves both balances untouched.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    balances: HashMap<(Account, String), u128>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `coin` into `account`.
    pub fn credit(&mut self, account: &Account, coin: &Coin) -> Result<(), LedgerError> {
        let balance = self
            .balances
            .entry((account.clone(), coin.denom.clone()))
            .or_default();
        *balance = balance
            .checked_add(coin.amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Sum of `denom` over every account.
    pub fn total_supply(&self, denom: &str) -> u128 {
        self.balances
            .iter()
            .filter(|((_, d), _)| d == denom)
            .fold(0u128, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    fn move_coin(&mut self, from: &Account, to: &Account, coin: &Coin) -> Result<(), LedgerError> {
        if coin.is_zero() || from == to {
            return Ok(());
        }
        let available = self.balance(from, &coin.denom);
        let remaining = available
            .checked_sub(coin.amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                account: from.to_string(),
                denom: coin.denom.clone(),
                available,
                required: coin.amount,
            })?;
        let credited = self
            .balance(to, &coin.denom)
            .checked_add(coin.amount)
            .ok_or(LedgerError::Overflow)?;
        self.balances
            .insert((from.clone(), coin.denom.clone()), remaining);
        self.balances
            .insert((to.clone(), coin.denom.clone()), credited);
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn balance(&self, account: &Account, denom: &str) -> u128 {
        self.balances
            .get(&(account.clone(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn deduct(
        &mut self,
        payer: &Account,
        collector: &Account,
        coin: &Coin,
    ) -> Result<(), LedgerError> {
        self.move_coin(payer, collector, coin)
    }

    fn transfer(&mut self, from: &Account, to: &Account, coin: &Coin) -> Result<(), LedgerError> {
        self.move_coin(from, to, coin)
    }
}

/// A single call observed by [`MockLedger`].
#[cfg(any(test, feature = "dev-context-only-utils"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Balance { account: Account, denom: String },
    Deduct { payer: Account, collector: Account, coin: Coin },
    Transfer { from: Account, to: Account, coin: Coin },
}

/// Test double: an [`InMemoryLedger`] that records every call and can be
/// told to fail all movements or only chosen transfers.
#[cfg(any(test, feature = "dev-context-only-utils"))]
#[derive(Debug, Default)]
pub struct MockLedger {
    pub inner: InMemoryLedger,
    calls: RefCell<Vec<LedgerCall>>,
    failure: Option<LedgerError>,
    /// Failures keyed by the 1-based index of the `transfer` call.
    transfer_failures: HashMap<usize, LedgerError>,
    transfers: usize,
}

#[cfg(any(test, feature = "dev-context-only-utils"))]
impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, account: &Account, coin: &Coin) -> Self {
        self.inner
            .credit(account, coin)
            .expect("mock balance overflow");
        self
    }

    /// Make every subsequent `deduct` and `transfer` return `err`.
    pub fn fail_with(mut self, err: LedgerError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Make only the `nth` `transfer` call (1-based) return `err`.
    pub fn fail_transfer(mut self, nth: usize, err: LedgerError) -> Self {
        self.transfer_failures.insert(nth, err);
        self
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.borrow().clone()
    }

    /// Calls that moved or tried to move funds.
    pub fn movements(&self) -> Vec<LedgerCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| !matches!(call, LedgerCall::Balance { .. }))
            .cloned()
            .collect()
    }
}

#[cfg(any(test, feature = "dev-context-only-utils"))]
impl Ledger for MockLedger {
    fn balance(&self, account: &Account, denom: &str) -> u128 {
        self.calls.borrow_mut().push(LedgerCall::Balance {
            account: account.clone(),
            denom: denom.to_string(),
        });
        self.inner.balance(account, denom)
    }

    fn deduct(
        &mut self,
        payer: &Account,
        collector: &Account,
        coin: &Coin,
    ) -> Result<(), LedgerError> {
        self.calls.borrow_mut().push(LedgerCall::Deduct {
            payer: payer.clone(),
            collector: collector.clone(),
            coin: coin.clone(),
        });
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => self.inner.deduct(payer, collector, coin),
        }
    }

    fn transfer(&mut self, from: &Account, to: &Account, coin: &Coin) -> Result<(), LedgerError> {
        self.calls.borrow_mut().push(LedgerCall::Transfer {
            from: from.clone(),
            to: to.clone(),
            coin: coin.clone(),
        });
        self.transfers += 1;
        let failure = self
            .failure
            .clone()
            .or_else(|| self.transfer_failures.get(&self.transfers).cloned());
        match failure {
            Some(err) => Err(err),
            None => self.inner.transfer(from, to, coin),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, assert_matches::assert_matches};

    #[test]
    fn test_address_display_is_base58() {
        assert_eq!(
            Address::default().to_string(),
            "11111111111111111111111111111111"
        );
        assert_ne!(Address::new_unique(), Address::new_unique());
    }

    #[test]
    fn test_transfer_moves_full_amount() {
        let alice = Account::User(Address::new_unique());
        let pool = Account::module("pool");
        let mut ledger = InMemoryLedger::new();
        ledger.credit(&alice, &Coin::new("stake", 100)).unwrap();

        ledger
            .transfer(&alice, &pool, &Coin::new("stake", 60))
            .unwrap();
        assert_eq!(ledger.balance(&alice, "stake"), 40);
        assert_eq!(ledger.balance(&pool, "stake"), 60);
        assert_eq!(ledger.total_supply("stake"), 100);
    }

    #[test]
    fn test_insufficient_funds_leaves_balances() {
        let alice = Account::User(Address::new_unique());
        let pool = Account::module("pool");
        let mut ledger = InMemoryLedger::new();
        ledger.credit(&alice, &Coin::new("stake", 10)).unwrap();

        assert_matches!(
            ledger.deduct(&alice, &pool, &Coin::new("stake", 11)),
            Err(LedgerError::InsufficientFunds {
                available: 10,
                required: 11,
                ..
            })
        );
        assert_eq!(ledger.balance(&alice, "stake"), 10);
        assert_eq!(ledger.balance(&pool, "stake"), 0);
    }

    #[test]
    fn test_mock_records_and_fails() {
        let alice = Account::User(Address::new_unique());
        let pool = Account::module("pool");
        let mut ledger = MockLedger::new()
            .with_balance(&alice, &Coin::new("stake", 10))
            .fail_with(LedgerError::Overflow);

        assert_eq!(ledger.balance(&alice, "stake"), 10);
        assert_eq!(
            ledger.transfer(&alice, &pool, &Coin::new("stake", 1)),
            Err(LedgerError::Overflow)
        );
        assert_eq!(ledger.calls().len(), 2);
        assert_eq!(ledger.movements().len(), 1);
        assert_eq!(ledger.inner.balance(&alice, "stake"), 10);
    }

    #[test]
    fn test_mock_fails_only_scripted_transfer() {
        let alice = Account::User(Address::new_unique());
        let pool = Account::module("pool");
        let mut ledger = MockLedger::new()
            .with_balance(&alice, &Coin::new("stake", 10))
            .fail_transfer(2, LedgerError::Overflow);

        assert_eq!(ledger.transfer(&alice, &pool, &Coin::new("stake", 1)), Ok(()));
        assert_eq!(
            ledger.transfer(&alice, &pool, &Coin::new("stake", 1)),
            Err(LedgerError::Overflow)
        );
        assert_eq!(ledger.transfer(&alice, &pool, &Coin::new("stake", 1)), Ok(()));
        assert_eq!(ledger.inner.balance(&pool, "stake"), 2);
    }
}
