//! In-memory receipt ledger

use crate::application::ports::{LedgerError, ReceiptLedger};
use crate::shared::protocol::{AccountId, ClassId};
use std::collections::HashMap;

/// Receipt balances per (holder, class) with per-class supply
#[derive(Debug, Clone, Default)]
pub struct InMemoryReceiptLedger {
    balances: HashMap<(AccountId, ClassId), u128>,
    supply: HashMap<ClassId, u128>,
}

impl InMemoryReceiptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outstanding receipts of a class across every holder
    pub fn class_supply(&self, class_id: &ClassId) -> u128 {
        self.supply.get(class_id).copied().unwrap_or(0)
    }

    /// Sum of individual balances, which must always equal `class_supply`
    pub fn sum_of_balances(&self, class_id: &ClassId) -> u128 {
        self.balances
            .iter()
            .filter(|((_, id), _)| id == class_id)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Holders with a non-zero balance in the class
    pub fn holders(&self, class_id: &ClassId) -> Vec<(AccountId, u128)> {
        let mut holders: Vec<_> = self
            .balances
            .iter()
            .filter(|((_, id), amount)| id == class_id && **amount > 0)
            .map(|((holder, _), amount)| (*holder, *amount))
            .collect();
        holders.sort();
        holders
    }
}

impl ReceiptLedger for InMemoryReceiptLedger {
    fn mint(&mut self, holder: AccountId, class_id: &ClassId, amount: u128) -> Result<(), LedgerError> {
        let supply = self
            .class_supply(class_id)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance_of(holder, class_id)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.supply.insert(*class_id, supply);
        self.balances.insert((holder, *class_id), balance);
        Ok(())
    }

    fn burn(&mut self, holder: AccountId, class_id: &ClassId, amount: u128) -> Result<(), LedgerError> {
        let held = self.balance_of(holder, class_id);
        if held < amount {
            return Err(LedgerError::InsufficientBalance {
                holder,
                class_id: *class_id,
                held,
                requested: amount,
            });
        }

        self.balances.insert((holder, *class_id), held - amount);
        let supply = self.class_supply(class_id).saturating_sub(amount);
        self.supply.insert(*class_id, supply);
        Ok(())
    }

    fn balance_of(&self, holder: AccountId, class_id: &ClassId) -> u128 {
        self.balances.get(&(holder, *class_id)).copied().unwrap_or(0)
    }
}
