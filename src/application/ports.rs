//! Collaborator ports
//!
//! The engine consumes three capabilities it does not implement:
//!
//! - [`PoolManager`]: the AMM pool engine. Reads the current tick, runs swaps
//!   and settles balances inside an `unlock` round trip.
//! - [`AssetTransfer`]: moves assets between a party and the engine's custody.
//! - [`ReceiptLedger`]: the multi-class fungible receipt ledger.
//!
//! It exposes two callback traits back to the pool engine: [`SwapHooks`] for
//! post-initialize / post-swap notifications and [`UnlockCallback`] for the
//! reentrant execution round trip. Hooks that keep state hand the pool engine
//! a [`SessionJournal`], which it checkpoints and resolves with every unlock
//! session so hook state never outlives a reverted session. Collaborators hand themselves to callbacks
//! as `&mut dyn PoolManager`, so a callback can call back into the pool engine
//! without either side holding a long-lived reference to the other.

use crate::error::HookError;
use crate::shared::protocol::{AccountId, BalanceDelta, ClassId, Currency, PoolId, PoolKey, SwapParams};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool {0} not found")]
    PoolNotFound(PoolId),

    #[error("pool {0} is already initialized")]
    AlreadyInitialized(PoolId),

    #[error("unlock sessions nested deeper than {0}")]
    SessionDepthExceeded(usize),

    #[error("operation requires an active unlock by {0}")]
    NotUnlocked(AccountId),

    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    #[error("price limit {limit} does not allow movement from tick {tick}")]
    PriceLimitReached { tick: i32, limit: i32 },

    #[error("{currency} balance of {owner} left unsettled: {delta}")]
    CurrencyNotSettled {
        owner: AccountId,
        currency: Currency,
        delta: i128,
    },

    #[error("take of {requested} {currency} exceeds the credit {available}")]
    InsufficientCredit {
        currency: Currency,
        available: i128,
        requested: u128,
    },

    #[error("invalid amount {0}")]
    InvalidAmount(u128),

    #[error("transfer failed: {0}")]
    Transfer(TransferError),

    /// A hook or unlock callback failed; the original error is preserved
    #[error("callback failed: {0}")]
    Callback(Box<HookError>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("{account} holds {available} {currency}, {requested} requested")]
    InsufficientBalance {
        account: AccountId,
        currency: Currency,
        available: u128,
        requested: u128,
    },

    #[error("{0} is frozen")]
    AccountFrozen(AccountId),

    #[error("balance overflow")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("{holder} holds {held} receipts of class {class_id}, {requested} requested")]
    InsufficientBalance {
        holder: AccountId,
        class_id: ClassId,
        held: u128,
        requested: u128,
    },

    #[error("receipt balance overflow")]
    Overflow,
}

/// AMM pool engine as seen by the engine
pub trait PoolManager {
    /// Account the pool manager calls hooks from
    fn account(&self) -> AccountId;

    /// Current tick of an initialized pool
    fn current_tick(&self, pool: &PoolId) -> Result<i32, PoolError>;

    /// Opens a flash-accounting session for `locker` and invokes the callback.
    /// All of the locker's currency deltas must net to zero when the callback
    /// returns; otherwise, or if the callback fails, every effect of the
    /// session is reverted. Sessions nest: a callback may unlock again, and
    /// the inner session must settle on its own.
    fn unlock(
        &mut self,
        locker: AccountId,
        callback: &mut dyn UnlockCallback,
    ) -> Result<(), PoolError>;

    /// Exact-input swap inside an unlock session. Deltas accrue to `sender`,
    /// who must be the active locker. `hooks.after_swap` runs once the pool
    /// state is updated; its failure fails the swap.
    fn swap(
        &mut self,
        sender: AccountId,
        key: &PoolKey,
        params: SwapParams,
        hooks: &mut dyn SwapHooks,
    ) -> Result<BalanceDelta, PoolError>;

    /// Pays `amount` of `currency` from `payer` to the pool, crediting the
    /// active locker's delta
    fn settle(&mut self, payer: AccountId, currency: &Currency, amount: u128) -> Result<(), PoolError>;

    /// Withdraws `amount` of `currency` owed to the active locker to `recipient`
    fn take(&mut self, currency: &Currency, recipient: AccountId, amount: u128) -> Result<(), PoolError>;
}

/// Reentrant half of an unlock round trip
pub trait UnlockCallback {
    fn unlock_callback(&mut self, manager: &mut dyn PoolManager) -> Result<(), HookError>;
}

/// Notifications the pool engine delivers to the pool's hook
pub trait SwapHooks {
    fn after_initialize(
        &mut self,
        manager: &mut dyn PoolManager,
        key: &PoolKey,
        tick: i32,
    ) -> Result<(), HookError>;

    fn after_swap(
        &mut self,
        manager: &mut dyn PoolManager,
        sender: AccountId,
        key: &PoolKey,
        params: &SwapParams,
        delta: BalanceDelta,
    ) -> Result<(), HookError>;

    /// State the pool engine must commit and revert together with its
    /// sessions. Collected once the pool is initialized.
    fn session_journal(&self) -> Option<Arc<dyn SessionJournal>> {
        None
    }
}

/// Hook state bound to the pool engine's unlock sessions.
///
/// Every session opened calls `checkpoint`, every session closed calls
/// `close` with its outcome, innermost first. A failed session restores the
/// state saved by its checkpoint, including work done by nested sessions
/// that had already committed.
pub trait SessionJournal: Send + Sync {
    fn checkpoint(&self);

    fn close(&self, committed: bool);
}

/// Asset custody: moves value between a party and the engine
pub trait AssetTransfer {
    /// Moves `amount` from `from` into the engine's custody
    fn debit(&mut self, from: AccountId, currency: &Currency, amount: u128) -> Result<(), TransferError>;

    /// Moves `amount` out of the engine's custody to `to`
    fn credit(&mut self, to: AccountId, currency: &Currency, amount: u128) -> Result<(), TransferError>;

    /// Account that holds the engine's custody, used as the payer when settling with the pool
    fn custodian(&self) -> AccountId;
}

/// Multi-class fungible receipt ledger
pub trait ReceiptLedger {
    fn mint(&mut self, holder: AccountId, class_id: &ClassId, amount: u128) -> Result<(), LedgerError>;

    fn burn(&mut self, holder: AccountId, class_id: &ClassId, amount: u128) -> Result<(), LedgerError>;

    fn balance_of(&self, holder: AccountId, class_id: &ClassId) -> u128;
}
