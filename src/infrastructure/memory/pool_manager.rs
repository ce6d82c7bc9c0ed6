//! In-memory pool manager
//!
//! Constant-product pools (`x * y = k`) with the fee taken from the input, a
//! tick derived from the reserve ratio (`floor(log_1.0001(reserve1 / reserve0))`)
//! and flash accounting through nested unlock sessions:
//!
//! - every `unlock` pushes a session for its locker, snapshotting pools and bank
//! - `swap`, `settle` and `take` accrue currency deltas to the innermost session
//! - a session must net every delta to zero when it closes
//! - a failed session restores its snapshot, so nothing it did survives
//! - hook journals collected at initialization are checkpointed and resolved
//!   with every session, so hook state reverts with the pools and the bank
//!
//! `after_swap` runs after the pool state is updated and before the swap
//! returns; a hook failure fails the swap and therefore the session around it.

use crate::application::ports::{
    PoolError, PoolManager, SessionJournal, SwapHooks, TransferError, UnlockCallback,
};
use crate::domain::tick_math::{mul_div_floor, MAX_TICK, MIN_TICK};
use crate::error::HookError;
use crate::infrastructure::memory::bank::Bank;
use crate::shared::protocol::{
    AccountId, BalanceDelta, Currency, Direction, PoolId, PoolKey, SwapParams,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Deepest allowed nesting of unlock sessions
pub const MAX_SESSION_DEPTH: usize = 8;

const FEE_DENOMINATOR: u128 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    pub key: PoolKey,
    pub reserve0: u128,
    pub reserve1: u128,
    pub tick: i32,
}

#[derive(Debug)]
struct Session {
    locker: AccountId,
    deltas: HashMap<Currency, i128>,
}

impl Session {
    fn accrue(&mut self, currency: &Currency, amount: i128) -> Result<(), PoolError> {
        let entry = self.deltas.entry(currency.clone()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(PoolError::InvalidAmount(amount.unsigned_abs()))?;
        Ok(())
    }
}

/// Hook set of a pool without hooks
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl SwapHooks for NoHooks {
    fn after_initialize(&mut self, _: &mut dyn PoolManager, _: &PoolKey, _: i32) -> Result<(), HookError> {
        Ok(())
    }

    fn after_swap(
        &mut self,
        _: &mut dyn PoolManager,
        _: AccountId,
        _: &PoolKey,
        _: &SwapParams,
        _: BalanceDelta,
    ) -> Result<(), HookError> {
        Ok(())
    }
}

pub struct InMemoryPoolManager {
    account: AccountId,
    bank: Bank,
    pools: HashMap<PoolId, PoolState>,
    sessions: Vec<Session>,
    /// Hook state that commits and reverts with sessions
    journals: Vec<Arc<dyn SessionJournal>>,
    /// Swaps sent by this account fail with `InsufficientLiquidity`
    halted_sender: Option<AccountId>,
}

/// Tick of the price `reserve1 / reserve0`
pub fn tick_at(reserve0: u128, reserve1: u128) -> i32 {
    if reserve0 == 0 {
        return MAX_TICK;
    }
    if reserve1 == 0 {
        return MIN_TICK;
    }
    let ratio = reserve1 as f64 / reserve0 as f64;
    let tick = (ratio.ln() / 1.0001f64.ln()).floor();
    tick.clamp(MIN_TICK as f64, MAX_TICK as f64) as i32
}

fn within_limit(direction: Direction, tick: i32, limit: i32) -> bool {
    match direction {
        Direction::ZeroForOne => tick >= limit,
        Direction::OneForZero => tick <= limit,
    }
}

fn signed(amount: u128) -> Result<i128, PoolError> {
    i128::try_from(amount).map_err(|_| PoolError::InvalidAmount(amount))
}

/// Output and post-swap reserves for an exact input of `amount_in`
fn quote(state: &PoolState, direction: Direction, amount_in: u128) -> Result<(u128, u128, u128), PoolError> {
    let fee = mul_div_floor(amount_in, state.key.fee as u128, FEE_DENOMINATOR)
        .ok_or(PoolError::InvalidAmount(amount_in))?;
    let net = amount_in - fee;

    let (reserve_in, reserve_out) = match direction {
        Direction::ZeroForOne => (state.reserve0, state.reserve1),
        Direction::OneForZero => (state.reserve1, state.reserve0),
    };
    let denominator = reserve_in
        .checked_add(net)
        .ok_or(PoolError::InvalidAmount(amount_in))?;
    let out = mul_div_floor(reserve_out, net, denominator).ok_or(PoolError::InsufficientLiquidity)?;
    if out >= reserve_out {
        return Err(PoolError::InsufficientLiquidity);
    }

    // the fee stays in the pool
    let new_in = reserve_in
        .checked_add(amount_in)
        .ok_or(PoolError::InvalidAmount(amount_in))?;
    let new_out = reserve_out - out;
    Ok(match direction {
        Direction::ZeroForOne => (out, new_in, new_out),
        Direction::OneForZero => (out, new_out, new_in),
    })
}

impl InMemoryPoolManager {
    pub fn new(account: AccountId, bank: Bank) -> Self {
        Self {
            account,
            bank,
            pools: HashMap::new(),
            sessions: Vec::new(),
            journals: Vec::new(),
            halted_sender: None,
        }
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    pub fn pool(&self, pool: &PoolId) -> Option<&PoolState> {
        self.pools.get(pool)
    }

    /// Makes every swap sent by `sender` fail, or clears the failure with `None`
    pub fn halt_swaps_from(&mut self, sender: Option<AccountId>) {
        self.halted_sender = sender;
    }

    /// Creates a pool seeded with the given reserves and notifies `hooks`.
    /// Returns the initial tick.
    pub fn initialize(
        &mut self,
        key: &PoolKey,
        reserve0: u128,
        reserve1: u128,
        hooks: &mut dyn SwapHooks,
    ) -> Result<i32, PoolError> {
        let pool = key.id();
        if self.pools.contains_key(&pool) {
            return Err(PoolError::AlreadyInitialized(pool));
        }
        if reserve0 == 0 || reserve1 == 0 {
            return Err(PoolError::InvalidAmount(0));
        }

        let snapshot = self.bank.snapshot();
        self.bank
            .mint(self.account, &key.currency0, reserve0)
            .and_then(|()| self.bank.mint(self.account, &key.currency1, reserve1))
            .map_err(PoolError::Transfer)?;

        let tick = tick_at(reserve0, reserve1);
        self.pools.insert(
            pool,
            PoolState {
                key: key.clone(),
                reserve0,
                reserve1,
                tick,
            },
        );

        if let Err(e) = hooks.after_initialize(self, key, tick) {
            self.pools.remove(&pool);
            self.bank.restore(snapshot);
            return Err(PoolError::Callback(Box::new(e)));
        }
        if let Some(journal) = hooks.session_journal() {
            self.register_journal(journal);
        }

        debug!(pool = %pool, reserve0, reserve1, tick, "pool initialized");
        Ok(tick)
    }

    /// Router entry point: swaps for `trader` inside a fresh session, pays the
    /// input from and the output to the trader's bank balance.
    ///
    /// The trader's balance is checked up front, so hook execution during the
    /// swap is the last step that can fail.
    pub fn swap_exact_input(
        &mut self,
        trader: AccountId,
        key: &PoolKey,
        params: SwapParams,
        hooks: &mut dyn SwapHooks,
    ) -> Result<BalanceDelta, PoolError> {
        let input = key.input_currency(params.direction);
        if self.bank.is_frozen(trader) {
            return Err(PoolError::Transfer(TransferError::AccountFrozen(trader)));
        }
        let available = self.bank.balance(trader, input);
        if available < params.amount_in {
            return Err(PoolError::Transfer(TransferError::InsufficientBalance {
                account: trader,
                currency: input.clone(),
                available,
                requested: params.amount_in,
            }));
        }

        self.with_session(trader, |manager| {
            let delta = manager.swap(trader, key, params, hooks)?;
            let owed = delta.input_owed(params.direction);
            manager.settle(trader, key.input_currency(params.direction), owed)?;
            let received = delta.output_received(params.direction);
            if received > 0 {
                manager.take(key.output_currency(params.direction), trader, received)?;
            }
            Ok(delta)
        })
    }

    fn register_journal(&mut self, journal: Arc<dyn SessionJournal>) {
        let known = self
            .journals
            .iter()
            .any(|j| std::ptr::addr_eq(Arc::as_ptr(j), Arc::as_ptr(&journal)));
        if !known {
            self.journals.push(journal);
        }
    }

    fn with_session<R>(
        &mut self,
        locker: AccountId,
        body: impl FnOnce(&mut Self) -> Result<R, PoolError>,
    ) -> Result<R, PoolError> {
        if self.sessions.len() >= MAX_SESSION_DEPTH {
            return Err(PoolError::SessionDepthExceeded(MAX_SESSION_DEPTH));
        }

        let pools = self.pools.clone();
        let bank = self.bank.snapshot();
        let journals = self.journals.clone();
        for journal in &journals {
            journal.checkpoint();
        }
        self.sessions.push(Session {
            locker,
            deltas: HashMap::new(),
        });

        let result = body(self);
        let session = self.sessions.pop();
        let result = result.and_then(|value| {
            if let Some(session) = session {
                if let Some((currency, delta)) = session.deltas.into_iter().find(|(_, d)| *d != 0) {
                    return Err(PoolError::CurrencyNotSettled {
                        owner: session.locker,
                        currency,
                        delta,
                    });
                }
            }
            Ok(value)
        });

        if result.is_err() {
            self.pools = pools;
            self.bank.restore(bank);
        }
        for journal in journals.iter().rev() {
            journal.close(result.is_ok());
        }
        result
    }

    fn session(&mut self, caller: AccountId) -> Result<&mut Session, PoolError> {
        self.sessions.last_mut().ok_or(PoolError::NotUnlocked(caller))
    }
}

impl PoolManager for InMemoryPoolManager {
    fn account(&self) -> AccountId {
        self.account
    }

    fn current_tick(&self, pool: &PoolId) -> Result<i32, PoolError> {
        self.pools
            .get(pool)
            .map(|state| state.tick)
            .ok_or(PoolError::PoolNotFound(*pool))
    }

    fn unlock(&mut self, locker: AccountId, callback: &mut dyn UnlockCallback) -> Result<(), PoolError> {
        self.with_session(locker, |manager| {
            callback
                .unlock_callback(manager)
                .map_err(|e| PoolError::Callback(Box::new(e)))
        })
    }

    fn swap(
        &mut self,
        sender: AccountId,
        key: &PoolKey,
        params: SwapParams,
        hooks: &mut dyn SwapHooks,
    ) -> Result<BalanceDelta, PoolError> {
        if self.session(sender)?.locker != sender {
            return Err(PoolError::NotUnlocked(sender));
        }
        if params.amount_in == 0 {
            return Err(PoolError::InvalidAmount(0));
        }
        if self.halted_sender == Some(sender) {
            return Err(PoolError::InsufficientLiquidity);
        }

        let pool = key.id();
        let state = self.pools.get(&pool).ok_or(PoolError::PoolNotFound(pool))?;
        let direction = params.direction;
        if !within_limit(direction, state.tick, params.tick_limit) || state.tick == params.tick_limit {
            return Err(PoolError::PriceLimitReached {
                tick: state.tick,
                limit: params.tick_limit,
            });
        }

        let mut consumed = params.amount_in;
        let mut outcome = quote(state, direction, consumed)?;
        if !within_limit(direction, tick_at(outcome.1, outcome.2), params.tick_limit) {
            // largest input that keeps the price inside the limit
            let (mut lo, mut hi) = (0u128, params.amount_in);
            while lo < hi {
                let mid = lo + (hi - lo + 1) / 2;
                let (_, r0, r1) = quote(state, direction, mid)?;
                if within_limit(direction, tick_at(r0, r1), params.tick_limit) {
                    lo = mid;
                } else {
                    hi = mid - 1;
                }
            }
            if lo == 0 {
                return Err(PoolError::PriceLimitReached {
                    tick: state.tick,
                    limit: params.tick_limit,
                });
            }
            consumed = lo;
            outcome = quote(state, direction, consumed)?;
        }

        let (out, reserve0, reserve1) = outcome;
        let delta = match direction {
            Direction::ZeroForOne => BalanceDelta::new(-signed(consumed)?, signed(out)?),
            Direction::OneForZero => BalanceDelta::new(signed(out)?, -signed(consumed)?),
        };

        let tick = tick_at(reserve0, reserve1);
        if let Some(state) = self.pools.get_mut(&pool) {
            state.reserve0 = reserve0;
            state.reserve1 = reserve1;
            state.tick = tick;
        }
        let session = self.session(sender)?;
        session.accrue(&key.currency0, delta.amount0)?;
        session.accrue(&key.currency1, delta.amount1)?;
        trace!(pool = %pool, sender = %sender, consumed, out, tick, "swap applied");

        hooks
            .after_swap(self, sender, key, &params, delta)
            .map_err(|e| PoolError::Callback(Box::new(e)))?;
        Ok(delta)
    }

    fn settle(&mut self, payer: AccountId, currency: &Currency, amount: u128) -> Result<(), PoolError> {
        let credit = signed(amount)?;
        self.session(payer)?;
        self.bank
            .transfer(payer, self.account, currency, amount)
            .map_err(PoolError::Transfer)?;
        self.session(payer)?.accrue(currency, credit)
    }

    fn take(&mut self, currency: &Currency, recipient: AccountId, amount: u128) -> Result<(), PoolError> {
        let debit = signed(amount)?;
        let session = self.session(recipient)?;
        let available = session.deltas.get(currency).copied().unwrap_or(0);
        if available < debit {
            return Err(PoolError::InsufficientCredit {
                currency: currency.clone(),
                available,
                requested: amount,
            });
        }
        self.bank
            .transfer(self.account, recipient, currency, amount)
            .map_err(PoolError::Transfer)?;
        self.session(recipient)?.accrue(currency, -debit)
    }
}
