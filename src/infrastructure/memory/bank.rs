//! In-memory asset bank
//!
//! Balances per (account, currency) behind a shared `parking_lot::Mutex`, so
//! the pool manager and the hook's custody adapter can hold handles to the
//! same books. Accounts can be frozen to make transfers touching them fail.

use crate::application::ports::{AssetTransfer, TransferError};
use crate::shared::protocol::{AccountId, Currency};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct BankState {
    balances: HashMap<(AccountId, Currency), u128>,
    frozen: HashSet<AccountId>,
}

impl BankState {
    fn balance(&self, account: AccountId, currency: &Currency) -> u128 {
        self.balances
            .get(&(account, currency.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        currency: &Currency,
        amount: u128,
    ) -> Result<(), TransferError> {
        for account in [from, to] {
            if self.frozen.contains(&account) {
                return Err(TransferError::AccountFrozen(account));
            }
        }
        if amount == 0 || from == to {
            return Ok(());
        }

        let available = self.balance(from, currency);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| TransferError::InsufficientBalance {
                account: from,
                currency: currency.clone(),
                available,
                requested: amount,
            })?;
        let credited = self
            .balance(to, currency)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;

        self.balances.insert((from, currency.clone()), remaining);
        self.balances.insert((to, currency.clone()), credited);
        Ok(())
    }
}

/// Shared handle to one set of balances
#[derive(Debug, Clone, Default)]
pub struct Bank {
    inner: Arc<Mutex<BankState>>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `amount` out of thin air for `account`
    pub fn mint(&self, account: AccountId, currency: &Currency, amount: u128) -> Result<(), TransferError> {
        let mut state = self.inner.lock();
        let balance = state
            .balance(account, currency)
            .checked_add(amount)
            .ok_or(TransferError::Overflow)?;
        state.balances.insert((account, currency.clone()), balance);
        Ok(())
    }

    pub fn balance(&self, account: AccountId, currency: &Currency) -> u128 {
        self.inner.lock().balance(account, currency)
    }

    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        currency: &Currency,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.inner.lock().transfer(from, to, currency, amount)
    }

    /// Every transfer from or to `account` fails until it is thawed
    pub fn freeze(&self, account: AccountId) {
        self.inner.lock().frozen.insert(account);
    }

    pub fn thaw(&self, account: AccountId) {
        self.inner.lock().frozen.remove(&account);
    }

    pub fn is_frozen(&self, account: AccountId) -> bool {
        self.inner.lock().frozen.contains(&account)
    }

    pub fn snapshot(&self) -> BankState {
        self.inner.lock().clone()
    }

    pub fn restore(&self, state: BankState) {
        *self.inner.lock() = state;
    }

    /// Sum of every account's balance in `currency`
    pub fn total_supply(&self, currency: &Currency) -> u128 {
        self.inner
            .lock()
            .balances
            .iter()
            .filter(|((_, c), _)| c == currency)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Custody adapter that moves assets between parties and `custodian`
    pub fn custody(&self, custodian: AccountId) -> BankTransfer {
        BankTransfer {
            bank: self.clone(),
            custodian,
        }
    }
}

/// [`AssetTransfer`] backed by a [`Bank`]
#[derive(Debug, Clone)]
pub struct BankTransfer {
    bank: Bank,
    custodian: AccountId,
}

impl BankTransfer {
    pub fn bank(&self) -> &Bank {
        &self.bank
    }
}

impl AssetTransfer for BankTransfer {
    fn debit(&mut self, from: AccountId, currency: &Currency, amount: u128) -> Result<(), TransferError> {
        self.bank.transfer(from, self.custodian, currency, amount)
    }

    fn credit(&mut self, to: AccountId, currency: &Currency, amount: u128) -> Result<(), TransferError> {
        self.bank.transfer(self.custodian, to, currency, amount)
    }

    fn custodian(&self) -> AccountId {
        self.custodian
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: AccountId = AccountId(1);
    const BOB: AccountId = AccountId(2);

    #[test]
    fn test_transfer_moves_balance() {
        let bank = Bank::new();
        let usdc = Currency::new("USDC");
        bank.mint(ALICE, &usdc, 100).unwrap();

        bank.transfer(ALICE, BOB, &usdc, 40).unwrap();
        assert_eq!(bank.balance(ALICE, &usdc), 60);
        assert_eq!(bank.balance(BOB, &usdc), 40);
        assert_eq!(bank.total_supply(&usdc), 100);
    }

    #[test]
    fn test_insufficient_balance() {
        let bank = Bank::new();
        let usdc = Currency::new("USDC");
        bank.mint(ALICE, &usdc, 10).unwrap();

        let err = bank.transfer(ALICE, BOB, &usdc, 11).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { available: 10, requested: 11, .. }));
        assert_eq!(bank.balance(ALICE, &usdc), 10);
    }

    #[test]
    fn test_frozen_account_blocks_both_ways() {
        let bank = Bank::new();
        let usdc = Currency::new("USDC");
        bank.mint(ALICE, &usdc, 10).unwrap();
        bank.freeze(BOB);

        assert_eq!(bank.transfer(ALICE, BOB, &usdc, 1), Err(TransferError::AccountFrozen(BOB)));
        bank.thaw(BOB);
        assert!(bank.transfer(ALICE, BOB, &usdc, 1).is_ok());
    }

    #[test]
    fn test_custody_adapter() {
        let bank = Bank::new();
        let weth = Currency::new("WETH");
        let custody_account = AccountId(99);
        bank.mint(ALICE, &weth, 50).unwrap();

        let mut custody = bank.custody(custody_account);
        custody.debit(ALICE, &weth, 50).unwrap();
        assert_eq!(bank.balance(custody_account, &weth), 50);

        custody.credit(BOB, &weth, 20).unwrap();
        assert_eq!(bank.balance(BOB, &weth), 20);
        assert_eq!(custody.custodian(), custody_account);
    }

    #[test]
    fn test_snapshot_restore() {
        let bank = Bank::new();
        let usdc = Currency::new("USDC");
        bank.mint(ALICE, &usdc, 10).unwrap();

        let snapshot = bank.snapshot();
        bank.transfer(ALICE, BOB, &usdc, 10).unwrap();
        bank.restore(snapshot);
        assert_eq!(bank.balance(ALICE, &usdc), 10);
        assert_eq!(bank.balance(BOB, &usdc), 0);
    }
}
